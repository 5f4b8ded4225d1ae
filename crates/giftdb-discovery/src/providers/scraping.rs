//! HTML-scraping search adapters: a reader proxy in front of a general web
//! search page, plus Bing and DuckDuckGo result pages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use giftdb_core::{Candidate, ProviderName};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use super::{Provider, ProviderKind};
use crate::allowlist::Retailer;
use crate::error::DiscoveryError;
use crate::extract::extract_product_urls;
use crate::fetch::PageFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeEngine {
    Reader,
    Bing,
    DuckDuckGo,
}

impl ScrapeEngine {
    #[must_use]
    pub fn for_provider(name: ProviderName) -> Option<Self> {
        match name {
            ProviderName::Reader => Some(ScrapeEngine::Reader),
            ProviderName::Bing => Some(ScrapeEngine::Bing),
            ProviderName::DuckDuckGo => Some(ScrapeEngine::DuckDuckGo),
            ProviderName::SearchApi => None,
        }
    }

    #[must_use]
    pub fn provider_name(self) -> ProviderName {
        match self {
            ScrapeEngine::Reader => ProviderName::Reader,
            ScrapeEngine::Bing => ProviderName::Bing,
            ScrapeEngine::DuckDuckGo => ProviderName::DuckDuckGo,
        }
    }

    #[must_use]
    pub fn default_base_url(self) -> &'static str {
        match self {
            ScrapeEngine::Reader => "https://r.jina.ai",
            ScrapeEngine::Bing => "https://www.bing.com",
            ScrapeEngine::DuckDuckGo => "https://html.duckduckgo.com",
        }
    }

    fn search_url(self, base: &str, query: &str) -> String {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
        match self {
            ScrapeEngine::Reader => format!("{base}/https://www.google.com/search?q={encoded}"),
            ScrapeEngine::Bing => format!("{base}/search?q={encoded}"),
            ScrapeEngine::DuckDuckGo => format!("{base}/html/?q={encoded}"),
        }
    }

    /// DuckDuckGo wraps result links in percent-encoded redirects.
    fn prepare_body(self, body: String) -> String {
        match self {
            ScrapeEngine::DuckDuckGo => percent_decode_str(&body).decode_utf8_lossy().into_owned(),
            ScrapeEngine::Reader | ScrapeEngine::Bing => body,
        }
    }
}

/// Query variants tried in order: restricted to the allow-listed retailers,
/// then with a toy synonym, then verbatim.
fn query_variants(query: &str) -> Vec<String> {
    let query = query.trim();
    let sites = Retailer::ALL
        .iter()
        .map(|r| format!("site:{}", r.domain()))
        .collect::<Vec<_>>()
        .join(" OR ");
    let mut variants = vec![
        format!("{query} ({sites})"),
        format!("{query} toy"),
        query.to_string(),
    ];
    variants.dedup();
    variants
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn jittered(delay: Duration) -> Duration {
    let ms = delay.as_millis() as f64 * (rand::random::<f64>() * 0.5 + 0.75);
    Duration::from_millis(ms as u64)
}

pub struct ScrapingProvider {
    engine: ScrapeEngine,
    base_url: String,
    fetcher: Arc<PageFetcher>,
    inter_attempt_delay: Duration,
    max_candidates: usize,
}

impl ScrapingProvider {
    #[must_use]
    pub fn new(engine: ScrapeEngine, fetcher: Arc<PageFetcher>, max_candidates: usize) -> Self {
        Self {
            engine,
            base_url: engine.default_base_url().to_string(),
            fetcher,
            inter_attempt_delay: Duration::ZERO,
            max_candidates,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_inter_attempt_delay(mut self, delay: Duration) -> Self {
        self.inter_attempt_delay = delay;
        self
    }

    async fn attempt(&self, variant: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        let url = self.engine.search_url(&self.base_url, variant);
        let body = self.fetcher.fetch_page(&url).await?;
        let body = self.engine.prepare_body(body);
        Ok(extract_product_urls(&body, self.max_candidates)
            .into_iter()
            .map(Candidate::new)
            .collect())
    }
}

#[async_trait]
impl Provider for ScrapingProvider {
    fn name(&self) -> &str {
        self.engine.provider_name().as_str()
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Scraper
    }

    /// Returns on the first variant yielding a candidate. When every variant
    /// failed outright, the last failure is returned; otherwise an empty list.
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        let variants = query_variants(query);
        let mut last_error = None;
        let mut any_clean = false;

        for (i, variant) in variants.iter().enumerate() {
            if i > 0 && !self.inter_attempt_delay.is_zero() {
                tokio::time::sleep(jittered(self.inter_attempt_delay)).await;
            }
            match self.attempt(variant).await {
                Ok(candidates) if !candidates.is_empty() => {
                    tracing::debug!(
                        provider = self.name(),
                        variant = i,
                        count = candidates.len(),
                        "scrape variant produced candidates"
                    );
                    return Ok(candidates);
                }
                Ok(_) => {
                    any_clean = true;
                    tracing::debug!(provider = self.name(), variant = i, "scrape variant empty");
                }
                Err(e) => {
                    tracing::debug!(provider = self.name(), variant = i, error = %e, "scrape variant failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_clean => Err(e),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_start_site_restricted_then_widen() {
        let variants = query_variants(" lego friends ");
        assert_eq!(variants.len(), 3);
        assert!(variants[0].starts_with("lego friends (site:amazon.com OR site:target.com"));
        assert!(variants[0].ends_with("site:etsy.com)"));
        assert_eq!(variants[1], "lego friends toy");
        assert_eq!(variants[2], "lego friends");
    }

    #[test]
    fn search_urls_encode_the_query() {
        assert_eq!(
            ScrapeEngine::Bing.search_url("http://mock", "lego friends"),
            "http://mock/search?q=lego%20friends"
        );
        assert_eq!(
            ScrapeEngine::Reader.search_url("https://r.jina.ai", "a&b"),
            "https://r.jina.ai/https://www.google.com/search?q=a%26b"
        );
        assert_eq!(
            ScrapeEngine::DuckDuckGo.search_url("http://mock", "doll"),
            "http://mock/html/?q=doll"
        );
    }

    #[test]
    fn duckduckgo_redirects_are_decoded() {
        let body = r#"<a href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.target.com%2Fp%2Fdoll%2F-%2FA-1&rut=x">"#;
        let decoded = ScrapeEngine::DuckDuckGo.prepare_body(body.to_string());
        assert!(decoded.contains("https://www.target.com/p/doll/-/A-1"));
        let untouched = ScrapeEngine::Bing.prepare_body(body.to_string());
        assert_eq!(untouched, body);
    }

    #[test]
    fn jitter_stays_within_a_quarter() {
        for _ in 0..20 {
            let ms = jittered(Duration::from_millis(1000)).as_millis();
            assert!((750..=1250).contains(&ms), "{ms}");
        }
    }
}
