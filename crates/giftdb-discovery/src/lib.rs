//! Product discovery and resolution.
//!
//! Turns a free-text query into validated [`ProductRecord`]s by walking a
//! chain of unreliable search providers, scraping candidate product pages,
//! and checking their images. Public entry points never fail: degraded
//! sources show up as fewer results plus notes in a [`DiagnosticTrace`].
//!
//! [`ProductRecord`]: giftdb_core::ProductRecord

pub mod allowlist;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod image;
pub mod orchestrator;
pub mod pipeline;
pub mod providers;
pub mod quota;
pub mod resolver;
pub mod retailer_search;
pub mod scrape;
pub mod trace;

pub use allowlist::{is_allowed_url, Retailer};
pub use dedup::{dedup_by_title, normalize_title, HasTitle};
pub use error::DiscoveryError;
pub use fetch::{BlockDetector, PageFetcher};
pub use image::ImageValidator;
pub use orchestrator::Orchestrator;
pub use pipeline::{Discovery, DiscoveryOutcome, DiscoveryRequest, DEFAULT_CONCURRENCY};
pub use providers::{Provider, ProviderKind, ScrapeEngine, ScrapingProvider, SearchApiProvider};
pub use quota::{PhraseQuotaClassifier, QuotaClassifier};
pub use resolver::{ProductEnricher, RowResolver};
pub use retailer_search::RetailerSearch;
pub use scrape::ProductScraper;
pub use trace::DiagnosticTrace;
