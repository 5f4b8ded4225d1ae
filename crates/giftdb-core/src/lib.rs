//! Shared configuration and data model for the giftdb product-discovery
//! pipeline.

pub mod app_config;
pub mod config;
pub mod error;
pub mod products;
pub mod seeds;

pub use app_config::{AppConfig, ProviderName, SearchApiCredentials};
pub use config::{load_app_config, load_app_config_from_env, load_app_config_from_lookup};
pub use error::ConfigError;
pub use products::{Candidate, CatalogRow, Price, ProductRecord, QueryFilters};
pub use seeds::{load_seeds, parse_seeds, SeedProduct, SeedsFile};
