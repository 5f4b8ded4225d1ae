//! Provider fallback chain.
//!
//! Providers are tried in priority order until one yields candidates. A
//! quota failure moves to the next provider in the chain; any other failure
//! skips ahead to the next scraping provider. Running out of providers is a
//! valid outcome: an empty candidate list with the decision path recorded in
//! the returned [`DiagnosticTrace`].

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use giftdb_core::{AppConfig, Candidate};

use crate::error::DiscoveryError;
use crate::fetch::PageFetcher;
use crate::providers::{build_chain, sanitize_candidates, Provider, ProviderKind};
use crate::quota::{PhraseQuotaClassifier, QuotaClassifier};
use crate::trace::DiagnosticTrace;

/// Context terms and exclusions appended to structured API queries.
const API_QUERY_SUFFIX: &str = "toys kids children -review -blog";

pub struct Orchestrator {
    providers: Vec<Arc<dyn Provider>>,
    classifier: Arc<dyn QuotaClassifier>,
    unavailable: Vec<String>,
    max_candidates: usize,
}

impl Orchestrator {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn Provider>>, max_candidates: usize) -> Self {
        Self {
            providers,
            classifier: Arc::new(PhraseQuotaClassifier::default()),
            unavailable: Vec::new(),
            max_candidates,
        }
    }

    /// Build the chain `config` describes. A configured but unusable API is
    /// reported in every query's trace.
    #[must_use]
    pub fn from_config(config: &AppConfig, fetcher: &Arc<PageFetcher>) -> Self {
        let chain = build_chain(config, fetcher);
        let mut orchestrator = Self::new(chain.providers, config.max_candidates);
        orchestrator.unavailable = chain.unavailable;
        orchestrator
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn QuotaClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// First scraping provider strictly after `idx`, or the chain length.
    fn next_scraper_after(&self, idx: usize) -> usize {
        self.providers
            .iter()
            .enumerate()
            .skip(idx + 1)
            .find(|(_, p)| p.kind() == ProviderKind::Scraper)
            .map_or(self.providers.len(), |(i, _)| i)
    }

    fn new_trace(&self) -> DiagnosticTrace {
        let mut trace = DiagnosticTrace::new();
        for note in &self.unavailable {
            trace.note(note.clone());
        }
        trace
    }

    /// Up to `max_candidates` candidates from the first provider that
    /// produces any. Never fails.
    pub async fn search(&self, query: &str) -> (Vec<Candidate>, DiagnosticTrace) {
        let mut trace = self.new_trace();
        let mut idx = 0;

        while let Some(provider) = self.providers.get(idx) {
            let name = provider.name();
            let result = call_provider(provider.as_ref(), query, &mut trace).await;

            let next = match result {
                Ok(candidates) => {
                    let candidates = sanitize_candidates(candidates, self.max_candidates);
                    trace.add(&format!("provider.{name}.results"), candidates.len() as u64);
                    trace.note(format!("{name}: {} candidates", candidates.len()));
                    if !candidates.is_empty() {
                        return (candidates, trace);
                    }
                    idx + 1
                }
                Err(e) => {
                    if self.record_failure(name, &e, &mut trace) {
                        idx + 1
                    } else {
                        self.next_scraper_after(idx)
                    }
                }
            };

            if let Some(fallback) = self.providers.get(next) {
                trace.incr("fallbacks");
                trace.note(format!("falling back from {name} to {}", fallback.name()));
                tracing::info!(from = name, to = fallback.name(), "provider fallback");
            }
            idx = next;
        }

        trace.note("provider chain exhausted; no candidates");
        (Vec::new(), trace)
    }

    /// Query every provider concurrently and merge their candidates in chain
    /// order. Every branch settles before merging; failures become notes.
    pub async fn search_parallel(&self, query: &str) -> (Vec<Candidate>, DiagnosticTrace) {
        let branches = self.providers.iter().map(|provider| async move {
            let mut trace = DiagnosticTrace::new();
            let name = provider.name();
            let candidates = match call_provider(provider.as_ref(), query, &mut trace).await {
                Ok(candidates) => {
                    trace.add(&format!("provider.{name}.results"), candidates.len() as u64);
                    trace.note(format!("{name}: {} candidates", candidates.len()));
                    candidates
                }
                Err(e) => {
                    self.record_failure(name, &e, &mut trace);
                    Vec::new()
                }
            };
            (candidates, trace)
        });

        let mut trace = self.new_trace();
        let mut merged = Vec::new();
        for (candidates, branch_trace) in join_all(branches).await {
            merged.extend(candidates);
            trace.absorb(branch_trace);
        }
        (sanitize_candidates(merged, self.max_candidates), trace)
    }

    /// Trace a provider failure, classified as quota exhaustion or a plain
    /// error. Returns `true` for quota exhaustion.
    fn record_failure(&self, name: &str, e: &DiscoveryError, trace: &mut DiagnosticTrace) -> bool {
        let message = e.to_string();
        if self.classifier.is_quota_exhausted(&message) {
            trace.incr(&format!("provider.{name}.quota"));
            trace.note(format!("{name} failed (quota exhausted): {message}"));
            tracing::warn!(provider = name, error = %e, "provider quota exhausted");
            true
        } else {
            trace.incr(&format!("provider.{name}.errors"));
            trace.note(format!("{name} failed: {message}"));
            tracing::warn!(provider = name, error = %e, "provider failed");
            false
        }
    }
}

/// Dispatch one provider call with the query shaped for its kind.
async fn call_provider(
    provider: &dyn Provider,
    query: &str,
    trace: &mut DiagnosticTrace,
) -> Result<Vec<Candidate>, DiscoveryError> {
    let shaped = match provider.kind() {
        ProviderKind::Api => format!("{} {API_QUERY_SUFFIX}", query.trim()),
        ProviderKind::Scraper => query.trim().to_string(),
    };
    trace.incr(&format!("provider.{}.attempts", provider.name()));
    tracing::debug!(provider = provider.name(), query = %shaped, "querying provider");
    provider.search(&shaped).await
}

/// Merge candidate lists, keeping the first occurrence of each URL.
pub(crate) fn merge_candidates(lists: impl IntoIterator<Item = Vec<Candidate>>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct FakeProvider {
        name: &'static str,
        kind: ProviderKind,
        outcome: fn() -> Result<Vec<Candidate>, DiscoveryError>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn new(
            name: &'static str,
            kind: ProviderKind,
            outcome: fn() -> Result<Vec<Candidate>, DiscoveryError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                kind,
                outcome,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn search(&self, query: &str) -> Result<Vec<Candidate>, DiscoveryError> {
            self.queries.lock().unwrap().push(query.to_string());
            (self.outcome)()
        }
    }

    fn quota_error() -> Result<Vec<Candidate>, DiscoveryError> {
        Err(DiscoveryError::Api {
            provider: "api".to_string(),
            status: 429,
            message: "Quota exceeded for quota metric 'Queries per day'".to_string(),
        })
    }

    fn server_error() -> Result<Vec<Candidate>, DiscoveryError> {
        Err(DiscoveryError::Api {
            provider: "api".to_string(),
            status: 500,
            message: "backend error".to_string(),
        })
    }

    fn empty() -> Result<Vec<Candidate>, DiscoveryError> {
        Ok(Vec::new())
    }

    fn two_hits() -> Result<Vec<Candidate>, DiscoveryError> {
        Ok(vec![
            Candidate::new("https://www.target.com/p/lego-friends-mall/-/A-1"),
            Candidate::new("https://www.example.com/not-a-retailer"),
            Candidate::new("https://www.lego.com/en-us/product/friends-cafe-41444"),
        ])
    }

    fn chain(providers: &[&Arc<FakeProvider>]) -> Vec<Arc<dyn Provider>> {
        providers
            .iter()
            .map(|p| Arc::clone(*p) as Arc<dyn Provider>)
            .collect()
    }

    #[tokio::test]
    async fn quota_error_moves_to_next_provider_and_is_traced_in_order() {
        let api = FakeProvider::new("api", ProviderKind::Api, quota_error);
        let backup_api = FakeProvider::new("backup_api", ProviderKind::Api, two_hits);
        let bing = FakeProvider::new("bing", ProviderKind::Scraper, two_hits);
        let orchestrator = Orchestrator::new(chain(&[&api, &backup_api, &bing]), 10);

        let (candidates, trace) = orchestrator.search("lego friends").await;

        assert_eq!(candidates.len(), 2);
        assert_eq!(backup_api.queries().len(), 1);
        assert!(bing.queries().is_empty());
        let failure = trace.find_note("api failed (quota exhausted)").unwrap();
        let fallback = trace.find_note("falling back from api to backup_api").unwrap();
        assert!(failure < fallback);
        assert_eq!(trace.count("provider.api.quota"), 1);
    }

    #[tokio::test]
    async fn generic_error_skips_to_next_scraper() {
        let api = FakeProvider::new("api", ProviderKind::Api, server_error);
        let backup_api = FakeProvider::new("backup_api", ProviderKind::Api, two_hits);
        let bing = FakeProvider::new("bing", ProviderKind::Scraper, two_hits);
        let orchestrator = Orchestrator::new(chain(&[&api, &backup_api, &bing]), 10);

        let (candidates, trace) = orchestrator.search("lego friends").await;

        assert_eq!(candidates.len(), 2);
        assert!(backup_api.queries().is_empty());
        assert_eq!(bing.queries(), vec!["lego friends"]);
        assert!(trace.find_note("falling back from api to bing").is_some());
        assert_eq!(trace.count("provider.api.errors"), 1);
    }

    #[tokio::test]
    async fn api_queries_are_augmented_scraper_queries_are_not() {
        let api = FakeProvider::new("api", ProviderKind::Api, empty);
        let bing = FakeProvider::new("bing", ProviderKind::Scraper, empty);
        let orchestrator = Orchestrator::new(chain(&[&api, &bing]), 10);

        let (candidates, trace) = orchestrator.search(" doll house ").await;

        assert!(candidates.is_empty());
        assert_eq!(
            api.queries(),
            vec!["doll house toys kids children -review -blog"]
        );
        assert_eq!(bing.queries(), vec!["doll house"]);
        assert!(trace.find_note("provider chain exhausted").is_some());
    }

    #[tokio::test]
    async fn results_are_capped_and_allow_listed() {
        let bing = FakeProvider::new("bing", ProviderKind::Scraper, two_hits);
        let orchestrator = Orchestrator::new(chain(&[&bing]), 1);

        let (candidates, trace) = orchestrator.search("lego").await;

        assert_eq!(
            candidates,
            vec![Candidate::new("https://www.target.com/p/lego-friends-mall/-/A-1")]
        );
        assert_eq!(trace.count("provider.bing.results"), 1);
    }

    #[tokio::test]
    async fn injected_classifier_changes_fallback_path() {
        let api = FakeProvider::new("api", ProviderKind::Api, server_error);
        let backup_api = FakeProvider::new("backup_api", ProviderKind::Api, two_hits);
        let orchestrator = Orchestrator::new(chain(&[&api, &backup_api]), 10)
            .with_classifier(Arc::new(|msg: &str| msg.contains("backend error")));

        let (candidates, _) = orchestrator.search("lego").await;

        assert_eq!(candidates.len(), 2);
        assert_eq!(backup_api.queries().len(), 1);
    }

    #[tokio::test]
    async fn parallel_search_settles_every_branch() {
        let api = FakeProvider::new("api", ProviderKind::Api, server_error);
        let bing = FakeProvider::new("bing", ProviderKind::Scraper, two_hits);
        let ddg = FakeProvider::new("duckduckgo", ProviderKind::Scraper, two_hits);
        let orchestrator = Orchestrator::new(chain(&[&api, &bing, &ddg]), 10);

        let (candidates, trace) = orchestrator.search_parallel("lego").await;

        assert_eq!(candidates.len(), 2);
        assert_eq!(ddg.queries().len(), 1);
        assert_eq!(trace.count("provider.api.errors"), 1);
        assert_eq!(trace.count("provider.bing.results"), 3);
        assert!(trace.find_note("api failed").unwrap() < trace.find_note("bing:").unwrap());
    }

    #[tokio::test]
    async fn parallel_search_classifies_quota_like_the_chain() {
        let api = FakeProvider::new("api", ProviderKind::Api, quota_error);
        let bing = FakeProvider::new("bing", ProviderKind::Scraper, two_hits);
        let orchestrator = Orchestrator::new(chain(&[&api, &bing]), 10);

        let (candidates, trace) = orchestrator.search_parallel("lego").await;

        assert_eq!(candidates.len(), 2);
        assert_eq!(trace.count("provider.api.quota"), 1);
        assert_eq!(trace.count("provider.api.errors"), 0);
        assert!(trace.find_note("api failed (quota exhausted)").is_some());
    }

    #[test]
    fn merge_keeps_first_occurrence() {
        let merged = merge_candidates([
            vec![Candidate::new("https://a.test/1"), Candidate::new("https://a.test/2")],
            vec![Candidate::new("https://a.test/2").with_title("dup"), Candidate::new("https://a.test/3")],
        ]);
        let urls: Vec<&str> = merged.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.test/1", "https://a.test/2", "https://a.test/3"]);
        assert!(merged[1].title.is_none());
    }
}
