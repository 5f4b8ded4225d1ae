use std::path::PathBuf;
use std::str::FromStr;

/// Identifies one search provider in the configured fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderName {
    /// Structured, credentialed search API (Google Programmable Search shape).
    SearchApi,
    /// General web search rendered through a reader proxy.
    Reader,
    /// Bing HTML results page.
    Bing,
    /// DuckDuckGo HTML results page.
    DuckDuckGo,
}

impl ProviderName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderName::SearchApi => "search_api",
            ProviderName::Reader => "reader",
            ProviderName::Bing => "bing",
            ProviderName::DuckDuckGo => "duckduckgo",
        }
    }
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search_api" | "api" | "google" => Ok(ProviderName::SearchApi),
            "reader" | "jina" => Ok(ProviderName::Reader),
            "bing" => Ok(ProviderName::Bing),
            "duckduckgo" | "ddg" => Ok(ProviderName::DuckDuckGo),
            other => Err(format!("unknown search provider '{other}'")),
        }
    }
}

/// Key + engine id pair for the structured search API.
#[derive(Clone, PartialEq, Eq)]
pub struct SearchApiCredentials {
    pub api_key: String,
    pub engine_id: String,
}

impl std::fmt::Debug for SearchApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchApiCredentials")
            .field("api_key", &"[redacted]")
            .field("engine_id", &self.engine_id)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub seeds_path: PathBuf,
    pub primary_provider: ProviderName,
    pub fallback_order: Vec<ProviderName>,
    pub search_api: Option<SearchApiCredentials>,
    pub search_api_base_url: String,
    pub reader_base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub inter_attempt_delay_ms: u64,
    pub inter_retailer_delay_ms: u64,
    pub max_candidates: usize,
    pub retailer_min_results: usize,
    pub row_limit: usize,
    pub enrich_limit: usize,
    pub max_concurrency: usize,
}

impl AppConfig {
    /// The full provider chain: primary first, then the fallback order with
    /// duplicates of earlier entries removed.
    #[must_use]
    pub fn provider_chain(&self) -> Vec<ProviderName> {
        let mut chain = vec![self.primary_provider];
        for name in &self.fallback_order {
            if !chain.contains(name) {
                chain.push(*name);
            }
        }
        chain
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("seeds_path", &self.seeds_path)
            .field("primary_provider", &self.primary_provider)
            .field("fallback_order", &self.fallback_order)
            .field("search_api", &self.search_api.as_ref().map(|_| "[redacted]"))
            .field("search_api_base_url", &self.search_api_base_url)
            .field("reader_base_url", &self.reader_base_url)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("image_timeout_secs", &self.image_timeout_secs)
            .field("inter_attempt_delay_ms", &self.inter_attempt_delay_ms)
            .field("inter_retailer_delay_ms", &self.inter_retailer_delay_ms)
            .field("max_candidates", &self.max_candidates)
            .field("retailer_min_results", &self.retailer_min_results)
            .field("row_limit", &self.row_limit)
            .field("enrich_limit", &self.enrich_limit)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}
