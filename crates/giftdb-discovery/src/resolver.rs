//! Seed-list row composition.
//!
//! Seeds are the baseline. Only a bounded prefix of the top seeds is sent
//! through discovery; an enrichment that finds nothing leaves the seed row
//! as it was.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use giftdb_core::{CatalogRow, ProductRecord, QueryFilters, SeedProduct};

use crate::dedup::dedup_by_title;
use crate::pipeline::{Discovery, DiscoveryRequest, DEFAULT_CONCURRENCY};
use crate::trace::DiagnosticTrace;

/// Looks up a retailer listing for one seed product.
#[async_trait]
pub trait ProductEnricher: Send + Sync {
    async fn enrich(
        &self,
        query: &str,
        filters: &QueryFilters,
    ) -> (Option<ProductRecord>, DiagnosticTrace);
}

#[async_trait]
impl ProductEnricher for Discovery {
    async fn enrich(
        &self,
        query: &str,
        filters: &QueryFilters,
    ) -> (Option<ProductRecord>, DiagnosticTrace) {
        let request = DiscoveryRequest {
            query: query.to_string(),
            filters: filters.clone(),
            ..DiscoveryRequest::default()
        };
        let outcome = self.discover(&request).await;
        (outcome.records.into_iter().next(), outcome.trace)
    }
}

pub struct RowResolver<E> {
    enricher: E,
    row_limit: usize,
    enrich_limit: usize,
    concurrency: usize,
}

impl<E: ProductEnricher> RowResolver<E> {
    #[must_use]
    pub fn new(enricher: E, row_limit: usize, enrich_limit: usize) -> Self {
        Self {
            enricher,
            row_limit,
            enrich_limit,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Cap on enrichments in flight at once. Zero is treated as one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Seeds matching `query` and `filters`, most popular first, capped at
    /// the row limit. Ties keep file order.
    #[must_use]
    pub fn select_seeds<'a>(
        &self,
        query: &str,
        seeds: &'a [SeedProduct],
        filters: &QueryFilters,
    ) -> Vec<&'a SeedProduct> {
        let mut selected: Vec<&SeedProduct> = seeds
            .iter()
            .filter(|s| s.matches_query(query))
            .filter(|s| seed_passes_filters(s, filters))
            .collect();
        selected.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        selected.truncate(self.row_limit);
        selected
    }

    /// Build catalog rows for `query`. Never fails: rows whose enrichment
    /// found nothing are returned unenriched.
    pub async fn resolve(
        &self,
        query: &str,
        seeds: &[SeedProduct],
        filters: &QueryFilters,
    ) -> (Vec<CatalogRow>, DiagnosticTrace) {
        let selected = self.select_seeds(query, seeds, filters);
        let mut trace = DiagnosticTrace::new();
        trace.add("rows.selected", selected.len() as u64);

        // Gender and category already narrowed the seeds; only the price
        // ceiling still applies to retailer listings.
        let enrich_filters = QueryFilters {
            max_price: filters.max_price,
            ..QueryFilters::default()
        };

        let split = self.enrich_limit.min(selected.len());
        let (head, tail) = selected.split_at(split);

        let enriched: Vec<_> = stream::iter(head.iter().map(|seed| {
            let query = seed.search_query();
            let enrich_filters = &enrich_filters;
            async move { self.enricher.enrich(&query, enrich_filters).await }
        }))
        .buffered(self.concurrency)
        .collect()
        .await;

        let mut rows = Vec::with_capacity(selected.len());
        for (seed, (record, branch_trace)) in head.iter().zip(enriched) {
            trace.absorb(branch_trace);
            let row = CatalogRow::from_seed(seed);
            match record {
                Some(record) => {
                    trace.incr("rows.enriched");
                    rows.push(row.with_record(&record));
                }
                None => {
                    trace.incr("rows.unenriched");
                    trace.note(format!("{}: no listing found; keeping seed row", seed.title));
                    rows.push(row);
                }
            }
        }
        rows.extend(tail.iter().map(|seed| CatalogRow::from_seed(seed)));

        let rows = dedup_by_title(rows);
        trace.add("rows.returned", rows.len() as u64);
        (rows, trace)
    }
}

fn seed_passes_filters(seed: &SeedProduct, filters: &QueryFilters) -> bool {
    if let Some(category) = filters.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        if !seed
            .category
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case(category))
        {
            return false;
        }
    }
    if let Some(gender) = filters.gender.as_deref().filter(|g| !g.trim().is_empty()) {
        if !seed.suits_gender(gender) {
            return false;
        }
    }
    match (filters.max_price, seed.price_min) {
        (Some(ceiling), Some(min)) => min <= ceiling,
        _ => true,
    }
}
