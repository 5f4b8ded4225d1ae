//! Search providers: each turns a query into candidate product URLs.

mod scraping;
mod search_api;

pub use scraping::{ScrapeEngine, ScrapingProvider};
pub use search_api::SearchApiProvider;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use giftdb_core::{AppConfig, Candidate, ProviderName};

use crate::allowlist::{canonicalize_url, is_allowed_url};
use crate::error::DiscoveryError;
use crate::fetch::PageFetcher;

/// How a provider obtains results, which decides how the orchestrator
/// shapes the query and where it falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Api,
    Scraper,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Candidates for `query`, canonicalised, allow-listed, and capped.
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, DiscoveryError>;
}

/// A configured provider chain plus the configured providers that could not
/// be built.
pub struct ProviderChain {
    pub providers: Vec<Arc<dyn Provider>>,
    pub unavailable: Vec<String>,
}

/// Build the provider chain described by `config`, in
/// [`AppConfig::provider_chain`] order.
///
/// A search API without credentials is skipped and reported in
/// `unavailable`. Scraping providers are always available.
#[must_use]
pub fn build_chain(config: &AppConfig, fetcher: &Arc<PageFetcher>) -> ProviderChain {
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();
    let mut unavailable = Vec::new();
    let delay = Duration::from_millis(config.inter_attempt_delay_ms);

    for name in config.provider_chain() {
        match name {
            ProviderName::SearchApi => match &config.search_api {
                Some(credentials) => providers.push(Arc::new(SearchApiProvider::new(
                    fetcher.client().clone(),
                    credentials.clone(),
                    &config.search_api_base_url,
                    fetcher.timeout(),
                    config.max_candidates,
                ))),
                None => {
                    tracing::info!(provider = %name, "search API credentials missing; provider skipped");
                    unavailable.push(DiscoveryError::ProviderUnavailable(name.to_string()).to_string());
                }
            },
            ProviderName::Reader | ProviderName::Bing | ProviderName::DuckDuckGo => {
                let Some(engine) = ScrapeEngine::for_provider(name) else {
                    continue;
                };
                let base = match engine {
                    ScrapeEngine::Reader => config.reader_base_url.as_str(),
                    other => other.default_base_url(),
                };
                providers.push(Arc::new(
                    ScrapingProvider::new(engine, Arc::clone(fetcher), config.max_candidates)
                        .with_base_url(base)
                        .with_inter_attempt_delay(delay),
                ));
            }
        }
    }

    ProviderChain {
        providers,
        unavailable,
    }
}

/// Canonicalise, allow-list, de-duplicate (first seen wins), and cap.
pub(crate) fn sanitize_candidates(candidates: Vec<Candidate>, max: usize) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|mut c| {
            c.url = canonicalize_url(&c.url)?;
            Some(c)
        })
        .filter(|c| is_allowed_url(&c.url))
        .filter(|c| seen.insert(c.url.clone()))
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::fetch::DEFAULT_USER_AGENT;

    fn config_with(vars: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        giftdb_core::load_app_config_from_lookup(|key| map.get(key).map(|v| (*v).to_string()))
            .unwrap()
    }

    fn fetcher() -> Arc<PageFetcher> {
        Arc::new(PageFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(1)).unwrap())
    }

    #[test]
    fn sanitize_drops_foreign_hosts_and_duplicates() {
        let out = sanitize_candidates(
            vec![
                Candidate::new("https://www.target.com/p/doll/-/A-1?ref=x"),
                Candidate::new("https://blog.example.com/best-toys"),
                Candidate::new("https://www.target.com/p/doll/-/A-1#top"),
                Candidate::new("https://www.lego.com/en-us/product/cafe-41444"),
                Candidate::new("https://www.etsy.com/listing/1/puzzle"),
            ],
            2,
        );
        let urls: Vec<&str> = out.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.target.com/p/doll/-/A-1",
                "https://www.lego.com/en-us/product/cafe-41444",
            ]
        );
    }

    #[test]
    fn missing_credentials_skip_api_provider() {
        let config = config_with(&[
            ("GIFTDB_SEARCH_PROVIDER", "search_api"),
            ("GIFTDB_SEARCH_FALLBACK_ORDER", "bing,duckduckgo"),
        ]);
        let chain = build_chain(&config, &fetcher());
        let names: Vec<&str> = chain.providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["bing", "duckduckgo"]);
        assert_eq!(chain.unavailable.len(), 1);
        assert!(chain.unavailable[0].contains("search_api"));
    }

    #[test]
    fn credentialed_api_leads_the_chain() {
        let config = config_with(&[
            ("GIFTDB_SEARCH_PROVIDER", "search_api"),
            ("GIFTDB_SEARCH_API_KEY", "k"),
            ("GIFTDB_SEARCH_API_ENGINE_ID", "cx"),
            ("GIFTDB_SEARCH_FALLBACK_ORDER", "reader"),
        ]);
        let chain = build_chain(&config, &fetcher());
        let kinds: Vec<ProviderKind> = chain.providers.iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec![ProviderKind::Api, ProviderKind::Scraper]);
        assert!(chain.unavailable.is_empty());
    }
}
