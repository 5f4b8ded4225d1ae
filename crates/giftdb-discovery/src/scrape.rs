//! Per-candidate product page metadata scraping.

use std::sync::Arc;

use giftdb_core::ProductRecord;

use crate::allowlist::is_allowed_url;
use crate::extract::{extract_product, record_from_url, Provenance};
use crate::fetch::PageFetcher;
use crate::trace::DiagnosticTrace;

pub struct ProductScraper {
    fetcher: Arc<PageFetcher>,
}

impl ProductScraper {
    #[must_use]
    pub fn new(fetcher: Arc<PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch `url` and extract a [`ProductRecord`] from it.
    ///
    /// A page that is blocked, unreachable, or has no titled Product block
    /// falls back to the URL slug. URLs off the allow-list are never fetched.
    /// Returns `None` only when neither the page nor the URL yields a title.
    pub async fn scrape(&self, url: &str) -> (Option<ProductRecord>, DiagnosticTrace) {
        let mut trace = DiagnosticTrace::new();

        if !is_allowed_url(url) {
            trace.incr("scrape.rejected");
            trace.note(format!("{url}: not an allow-listed retailer URL"));
            return (None, trace);
        }

        let extracted = match self.fetcher.fetch_page(url).await {
            Ok(body) => extract_product(&body, url),
            Err(e) => {
                trace.incr("scrape.fetch_failed");
                trace.note(format!("{url}: {e}; using URL heuristic"));
                tracing::debug!(url, error = %e, "product page fetch failed");
                record_from_url(url).map(|record| (record, Provenance::UrlSlug))
            }
        };

        match extracted {
            Some((record, provenance)) => {
                trace.incr(&format!("scrape.{}", provenance.as_str()));
                (Some(record), trace)
            }
            None => {
                trace.incr("scrape.empty");
                trace.note(format!("{url}: no title recoverable"));
                (None, trace)
            }
        }
    }
}
