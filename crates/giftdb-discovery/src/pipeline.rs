//! End-to-end discovery: search, scrape, validate, filter, de-duplicate.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use giftdb_core::{AppConfig, Candidate, ProductRecord, QueryFilters};
use serde::Serialize;

use crate::dedup::dedup_by_title;
use crate::error::DiscoveryError;
use crate::fetch::PageFetcher;
use crate::image::ImageValidator;
use crate::orchestrator::{merge_candidates, Orchestrator};
use crate::retailer_search::RetailerSearch;
use crate::scrape::ProductScraper;
use crate::trace::DiagnosticTrace;

/// Page scrapes, image checks or row enrichments in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct DiscoveryRequest {
    pub query: String,
    pub filters: QueryFilters,
    /// Also fan out across retailer storefronts, concurrently with the
    /// provider chain.
    pub with_retailers: bool,
    /// Query every provider at once instead of walking the fallback chain.
    pub parallel: bool,
}

impl DiscoveryRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryOutcome {
    pub records: Vec<ProductRecord>,
    pub trace: DiagnosticTrace,
}

pub struct Discovery {
    orchestrator: Orchestrator,
    retailers: RetailerSearch,
    scraper: ProductScraper,
    images: ImageValidator,
    max_records: usize,
    concurrency: usize,
}

impl Discovery {
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        retailers: RetailerSearch,
        scraper: ProductScraper,
        images: ImageValidator,
        max_records: usize,
    ) -> Self {
        Self {
            orchestrator,
            retailers,
            scraper,
            images,
            max_records,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Cap on page scrapes and image checks in flight at once. Zero is
    /// treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Wire the whole pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, DiscoveryError> {
        let fetcher = PageFetcher::new(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::from_fetcher(config, Arc::new(fetcher)))
    }

    /// Wire the pipeline around an existing fetcher.
    #[must_use]
    pub fn from_fetcher(config: &AppConfig, fetcher: Arc<PageFetcher>) -> Self {
        let images = ImageValidator::new(
            fetcher.client().clone(),
            Duration::from_secs(config.image_timeout_secs),
        );
        Self::new(
            Orchestrator::from_config(config, &fetcher),
            RetailerSearch::from_config(config, &fetcher),
            ProductScraper::new(Arc::clone(&fetcher)),
            images,
            config.max_candidates,
        )
        .with_concurrency(config.max_concurrency)
    }

    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub fn retailers(&self) -> &RetailerSearch {
        &self.retailers
    }

    #[must_use]
    pub fn scraper(&self) -> &ProductScraper {
        &self.scraper
    }

    #[must_use]
    pub fn images(&self) -> &ImageValidator {
        &self.images
    }

    /// Run the full pipeline for one query. Never fails: an empty record
    /// list with trace notes is a valid outcome.
    pub async fn discover(&self, request: &DiscoveryRequest) -> DiscoveryOutcome {
        let query = request.filters.apply_to_query(&request.query);
        let mut trace = DiagnosticTrace::new();
        trace.note(format!("query: {query}"));

        let candidates = self.gather_candidates(&query, request, &mut trace).await;
        trace.add("candidates", candidates.len() as u64);
        if candidates.is_empty() {
            return DiscoveryOutcome {
                records: Vec::new(),
                trace,
            };
        }

        let scrapes: Vec<_> = candidates.iter().map(|c| self.scraper.scrape(&c.url)).collect();
        let scraped: Vec<_> = stream::iter(scrapes)
            .buffered(self.concurrency)
            .collect()
            .await;
        let mut records = Vec::new();
        for (record, branch_trace) in scraped {
            trace.absorb(branch_trace);
            records.extend(record);
        }

        let records = self.keep_valid_images(records, &mut trace).await;

        let before = records.len();
        let records: Vec<ProductRecord> = records
            .into_iter()
            .filter(|r| request.filters.price_allows(r.price.as_ref()))
            .collect();
        trace.add("filtered.price", (before - records.len()) as u64);

        let mut records = dedup_by_title(records);
        records.truncate(self.max_records);
        trace.add("records", records.len() as u64);
        tracing::info!(query = %query, count = records.len(), "discovery finished");

        DiscoveryOutcome { records, trace }
    }

    async fn gather_candidates(
        &self,
        query: &str,
        request: &DiscoveryRequest,
        trace: &mut DiagnosticTrace,
    ) -> Vec<Candidate> {
        let providers = async {
            if request.parallel {
                self.orchestrator.search_parallel(query).await
            } else {
                self.orchestrator.search(query).await
            }
        };

        if request.with_retailers {
            let ((from_providers, provider_trace), (from_retailers, retailer_trace)) =
                tokio::join!(providers, self.retailers.search(query));
            trace.absorb(provider_trace);
            trace.absorb(retailer_trace);
            merge_candidates([from_providers, from_retailers])
        } else {
            let (from_providers, provider_trace) = providers.await;
            trace.absorb(provider_trace);
            from_providers
        }
    }

    /// Drop records whose image fails validation. Records without an image
    /// pass through untouched.
    async fn keep_valid_images(
        &self,
        records: Vec<ProductRecord>,
        trace: &mut DiagnosticTrace,
    ) -> Vec<ProductRecord> {
        let checks: Vec<_> = records
            .iter()
            .map(|r| async move {
                match r.image_url.as_deref() {
                    Some(url) => self.images.validate(url).await,
                    None => true,
                }
            })
            .collect();
        let verdicts: Vec<bool> = stream::iter(checks)
            .buffered(self.concurrency)
            .collect()
            .await;

        records
            .into_iter()
            .zip(verdicts)
            .filter_map(|(record, ok)| {
                if ok {
                    Some(record)
                } else {
                    trace.incr("images.invalid");
                    trace.note(format!(
                        "{}: image rejected ({})",
                        record.product_url,
                        record.image_url.as_deref().unwrap_or_default()
                    ));
                    None
                }
            })
            .collect()
    }
}
