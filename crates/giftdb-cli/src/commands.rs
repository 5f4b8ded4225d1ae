//! Subcommand handlers. Each prints its result as pretty JSON on stdout;
//! an empty result is still a successful run.

use std::path::PathBuf;

use giftdb_core::{AppConfig, QueryFilters};
use giftdb_discovery::{Discovery, DiscoveryRequest, RowResolver};
use serde::Serialize;
use serde_json::json;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn run_search(
    config: &AppConfig,
    query: String,
    filters: QueryFilters,
    with_retailers: bool,
    parallel: bool,
) -> anyhow::Result<()> {
    let discovery = Discovery::from_config(config)?;
    let request = DiscoveryRequest {
        query,
        filters,
        with_retailers,
        parallel,
    };
    let outcome = discovery.discover(&request).await;
    tracing::info!(count = outcome.records.len(), "search complete");
    print_json(&outcome)
}

pub(crate) async fn run_retailers(config: &AppConfig, query: &str) -> anyhow::Result<()> {
    let discovery = Discovery::from_config(config)?;
    let (candidates, trace) = discovery.retailers().search(query).await;
    print_json(&json!({ "candidates": candidates, "trace": trace }))
}

pub(crate) async fn run_scrape(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let discovery = Discovery::from_config(config)?;
    let (record, trace) = discovery.scraper().scrape(url).await;
    print_json(&json!({ "record": record, "trace": trace }))
}

pub(crate) async fn run_verify_image(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let discovery = Discovery::from_config(config)?;
    let valid = discovery.images().validate(url).await;
    print_json(&json!({ "url": url, "valid": valid }))
}

pub(crate) async fn run_rows(
    config: &AppConfig,
    query: &str,
    seeds_path: Option<PathBuf>,
    filters: &QueryFilters,
) -> anyhow::Result<()> {
    let path = seeds_path.unwrap_or_else(|| config.seeds_path.clone());
    let seeds = giftdb_core::load_seeds(&path)?.seeds;
    tracing::info!(path = %path.display(), count = seeds.len(), "loaded seeds");

    let discovery = Discovery::from_config(config)?;
    let resolver = RowResolver::new(discovery, config.row_limit, config.enrich_limit)
        .with_concurrency(config.max_concurrency);
    let (rows, trace) = resolver.resolve(query, &seeds, filters).await;
    print_json(&json!({ "rows": rows, "trace": trace }))
}
