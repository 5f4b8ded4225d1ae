//! Quota-exhaustion classification for provider errors.

const DEFAULT_QUOTA_PHRASES: [&str; 7] = [
    "quota exceeded",
    "quota has been exceeded",
    "rate limit",
    "ratelimit",
    "too many requests",
    "daily limit",
    "resource has been exhausted",
];

/// Decides whether a provider failure means "this provider is out of quota".
///
/// Quota failures skip straight to the next provider in the chain; anything
/// else is treated as a generic failure.
pub trait QuotaClassifier: Send + Sync {
    fn is_quota_exhausted(&self, message: &str) -> bool;
}

impl<F> QuotaClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_quota_exhausted(&self, message: &str) -> bool {
        self(message)
    }
}

/// Case-insensitive substring match against a phrase list.
#[derive(Debug, Clone)]
pub struct PhraseQuotaClassifier {
    phrases: Vec<String>,
}

impl Default for PhraseQuotaClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_PHRASES)
    }
}

impl PhraseQuotaClassifier {
    #[must_use]
    pub fn new(phrases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

impl QuotaClassifier for PhraseQuotaClassifier {
    fn is_quota_exhausted(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        self.phrases.iter().any(|p| lowered.contains(p.as_str()))
    }
}
