use thiserror::Error;

/// Failures inside the discovery pipeline.
///
/// None of these escape the public entry points: adapters convert them into
/// empty results plus a [`crate::DiagnosticTrace`] note.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("request to {url} exceeded its {budget_ms}ms budget")]
    Timeout { url: String, budget_ms: u128 },

    #[error("soft block from {url}: {reason}")]
    Blocked { url: String, reason: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("provider {0} is unavailable")]
    ProviderUnavailable(String),
}
