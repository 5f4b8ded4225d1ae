//! Per-retailer fan-out search.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use giftdb_core::{AppConfig, Candidate};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::allowlist::{origin_path_key, Retailer};
use crate::error::DiscoveryError;
use crate::extract::extract_retailer_urls;
use crate::fetch::PageFetcher;
use crate::providers::{Provider, ScrapeEngine, ScrapingProvider, SearchApiProvider};
use crate::trace::DiagnosticTrace;

pub struct RetailerSearch {
    fetcher: Arc<PageFetcher>,
    api: Option<Arc<SearchApiProvider>>,
    legacy: Option<Arc<dyn Provider>>,
    retailers: Vec<Retailer>,
    inter_retailer_delay: Duration,
    min_results: usize,
    per_retailer_max: usize,
}

impl RetailerSearch {
    /// Scrape-only search across every allow-listed retailer, with no
    /// legacy top-up.
    #[must_use]
    pub fn new(fetcher: Arc<PageFetcher>, per_retailer_max: usize) -> Self {
        Self {
            fetcher,
            api: None,
            legacy: None,
            retailers: Retailer::ALL.to_vec(),
            inter_retailer_delay: Duration::ZERO,
            min_results: 0,
            per_retailer_max,
        }
    }

    /// Site-restricted API search when credentials exist, storefront scraping
    /// otherwise, and the reader proxy as the legacy top-up.
    #[must_use]
    pub fn from_config(config: &AppConfig, fetcher: &Arc<PageFetcher>) -> Self {
        let api = config.search_api.as_ref().map(|credentials| {
            Arc::new(SearchApiProvider::new(
                fetcher.client().clone(),
                credentials.clone(),
                &config.search_api_base_url,
                fetcher.timeout(),
                config.max_candidates,
            ))
        });
        let legacy: Arc<dyn Provider> = Arc::new(
            ScrapingProvider::new(ScrapeEngine::Reader, Arc::clone(fetcher), config.max_candidates)
                .with_base_url(&config.reader_base_url)
                .with_inter_attempt_delay(Duration::from_millis(config.inter_attempt_delay_ms)),
        );

        let mut search = Self::new(Arc::clone(fetcher), config.max_candidates)
            .with_legacy(legacy, config.retailer_min_results)
            .with_inter_retailer_delay(Duration::from_millis(config.inter_retailer_delay_ms));
        search.api = api;
        search
    }

    #[must_use]
    pub fn with_api(mut self, api: Arc<SearchApiProvider>) -> Self {
        self.api = Some(api);
        self
    }

    /// Invoke `legacy` when the fan-out produces fewer than `min_results`.
    #[must_use]
    pub fn with_legacy(mut self, legacy: Arc<dyn Provider>, min_results: usize) -> Self {
        self.legacy = Some(legacy);
        self.min_results = min_results;
        self
    }

    #[must_use]
    pub fn with_retailers(mut self, retailers: Vec<Retailer>) -> Self {
        self.retailers = retailers;
        self
    }

    #[must_use]
    pub fn with_inter_retailer_delay(mut self, delay: Duration) -> Self {
        self.inter_retailer_delay = delay;
        self
    }

    /// Search every retailer concurrently, staggering branch starts by the
    /// inter-retailer delay, then merge, top up, and de-duplicate by
    /// origin and path. Never fails.
    pub async fn search(&self, query: &str) -> (Vec<Candidate>, DiagnosticTrace) {
        let branches = self.retailers.iter().enumerate().map(|(i, retailer)| {
            let stagger = self
                .inter_retailer_delay
                .saturating_mul(u32::try_from(i).unwrap_or(u32::MAX));
            async move {
                if !stagger.is_zero() {
                    tokio::time::sleep(stagger).await;
                }
                self.search_retailer(*retailer, query).await
            }
        });

        let mut trace = DiagnosticTrace::new();
        let mut combined = Vec::new();
        for (candidates, branch_trace) in join_all(branches).await {
            combined.extend(candidates);
            trace.absorb(branch_trace);
        }

        if combined.len() < self.min_results {
            if let Some(legacy) = &self.legacy {
                trace.note(format!(
                    "retailer fan-out found {} (< {}); invoking {}",
                    combined.len(),
                    self.min_results,
                    legacy.name()
                ));
                match legacy.search(query).await {
                    Ok(extra) => {
                        trace.add("retailers.legacy", extra.len() as u64);
                        combined.extend(extra);
                    }
                    Err(e) => {
                        trace.note(format!("{} failed: {e}", legacy.name()));
                        tracing::warn!(provider = legacy.name(), error = %e, "legacy retailer path failed");
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        let deduped: Vec<Candidate> = combined
            .into_iter()
            .filter(|c| origin_path_key(&c.url).is_some_and(|key| seen.insert(key)))
            .collect();
        trace.add("retailers.total", deduped.len() as u64);
        (deduped, trace)
    }

    async fn search_retailer(
        &self,
        retailer: Retailer,
        query: &str,
    ) -> (Vec<Candidate>, DiagnosticTrace) {
        let mut trace = DiagnosticTrace::new();
        let domain = retailer.domain();

        if let Some(api) = &self.api {
            match api.search(&format!("{} site:{domain}", query.trim())).await {
                Ok(candidates) if !candidates.is_empty() => {
                    let candidates: Vec<Candidate> = candidates
                        .into_iter()
                        .filter(|c| Retailer::from_url(&c.url) == Some(retailer))
                        .collect();
                    trace.add(&format!("retailer.{domain}.api"), candidates.len() as u64);
                    trace.note(format!("{domain}: {} via search API", candidates.len()));
                    if !candidates.is_empty() {
                        return (candidates, trace);
                    }
                }
                Ok(_) => trace.note(format!("{domain}: search API returned nothing")),
                Err(e) => {
                    trace.note(format!("{domain}: search API failed: {e}"));
                    tracing::debug!(retailer = domain, error = %e, "site-restricted API search failed");
                }
            }
        }

        match self.scrape_storefront(retailer, query).await {
            Ok(candidates) => {
                trace.add(&format!("retailer.{domain}.scraped"), candidates.len() as u64);
                trace.note(format!("{domain}: {} via storefront search", candidates.len()));
                (candidates, trace)
            }
            Err(e) => {
                trace.incr(&format!("retailer.{domain}.errors"));
                trace.note(format!("{domain}: storefront search failed: {e}"));
                tracing::warn!(retailer = domain, error = %e, "storefront search failed");
                (Vec::new(), trace)
            }
        }
    }

    async fn scrape_storefront(
        &self,
        retailer: Retailer,
        query: &str,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        let encoded = utf8_percent_encode(query.trim(), NON_ALPHANUMERIC).to_string();
        let url = format!("{}{}", retailer.origin(), retailer.search_path(&encoded));
        let body = self.fetcher.fetch_page(&url).await?;
        Ok(extract_retailer_urls(retailer, &body, self.per_retailer_max)
            .into_iter()
            .map(Candidate::new)
            .collect())
    }
}
