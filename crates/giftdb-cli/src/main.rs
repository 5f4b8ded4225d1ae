mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use giftdb_core::QueryFilters;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "giftdb-cli")]
#[command(about = "Gift product discovery command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Default, PartialEq, Args)]
struct FilterArgs {
    /// Recipient gender, e.g. "girls" or "boys"
    #[arg(long)]
    gender: Option<String>,
    /// Product category, e.g. "building-sets"
    #[arg(long)]
    category: Option<String>,
    /// Drop results priced above this amount
    #[arg(long)]
    max_price: Option<Decimal>,
}

impl From<FilterArgs> for QueryFilters {
    fn from(args: FilterArgs) -> Self {
        QueryFilters {
            gender: args.gender,
            category: args.category,
            max_price: args.max_price,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discover validated product records for a query
    Search {
        query: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Also search each retailer's storefront
        #[arg(long)]
        with_retailers: bool,
        /// Query all providers at once instead of falling back in order
        #[arg(long)]
        parallel: bool,
    },
    /// Search retailer storefronts only
    Retailers { query: String },
    /// Extract product metadata from one product page
    Scrape { url: String },
    /// Check that an image URL serves an image
    VerifyImage { url: String },
    /// Build catalog rows from the seed list, enriching the top entries
    Rows {
        /// Restrict seeds to those matching this text
        #[arg(default_value = "")]
        query: String,
        /// Seed YAML file (defaults to GIFTDB_SEEDS_PATH)
        #[arg(long)]
        seeds: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = giftdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search {
            query,
            filters,
            with_retailers,
            parallel,
        } => {
            commands::run_search(&config, query, filters.into(), with_retailers, parallel).await
        }
        Commands::Retailers { query } => commands::run_retailers(&config, &query).await,
        Commands::Scrape { url } => commands::run_scrape(&config, &url).await,
        Commands::VerifyImage { url } => commands::run_verify_image(&config, &url).await,
        Commands::Rows {
            query,
            seeds,
            filters,
        } => commands::run_rows(&config, &query, seeds, &filters.into()).await,
    }
}

#[cfg(test)]
mod tests;
