use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read seeds file {path}: {source}")]
    SeedsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse seeds file: {0}")]
    SeedsFileParse(#[source] serde_yaml::Error),

    #[error("seed validation failed: {0}")]
    Validation(String),
}
