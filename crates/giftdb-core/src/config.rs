use crate::app_config::{AppConfig, ProviderName, SearchApiCredentials};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load application configuration from an arbitrary key/value source, such
/// as settings assembled by an embedding application.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_lookup<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    build_app_config(|key| lookup(key).ok_or(std::env::VarError::NotPresent))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default: an empty environment yields a config whose
/// chain is made only of scraping providers, which need no credentials.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let non_empty = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("GIFTDB_LOG_LEVEL", "info");
    let seeds_path = PathBuf::from(or_default("GIFTDB_SEEDS_PATH", "./config/seeds.yaml"));

    let primary_provider = parse_provider(
        "GIFTDB_SEARCH_PROVIDER",
        &or_default("GIFTDB_SEARCH_PROVIDER", "reader"),
    )?;
    let fallback_order = parse_provider_list(
        "GIFTDB_SEARCH_FALLBACK_ORDER",
        &or_default("GIFTDB_SEARCH_FALLBACK_ORDER", "bing,duckduckgo"),
    )?;

    let search_api = match (
        non_empty("GIFTDB_SEARCH_API_KEY"),
        non_empty("GIFTDB_SEARCH_API_ENGINE_ID"),
    ) {
        (Some(api_key), Some(engine_id)) => Some(SearchApiCredentials { api_key, engine_id }),
        _ => None,
    };

    let search_api_base_url = or_default(
        "GIFTDB_SEARCH_API_BASE_URL",
        "https://www.googleapis.com",
    );
    let reader_base_url = or_default("GIFTDB_READER_BASE_URL", "https://r.jina.ai");
    let user_agent = or_default("GIFTDB_USER_AGENT", DEFAULT_USER_AGENT);

    let request_timeout_secs = parse_u64("GIFTDB_REQUEST_TIMEOUT_SECS", "10")?;
    let image_timeout_secs = parse_u64("GIFTDB_IMAGE_TIMEOUT_SECS", "5")?;
    let inter_attempt_delay_ms = parse_u64("GIFTDB_INTER_ATTEMPT_DELAY_MS", "750")?;
    let inter_retailer_delay_ms = parse_u64("GIFTDB_INTER_RETAILER_DELAY_MS", "300")?;
    let max_candidates = parse_usize("GIFTDB_MAX_CANDIDATES", "10")?;
    let retailer_min_results = parse_usize("GIFTDB_RETAILER_MIN_RESULTS", "5")?;
    let row_limit = parse_usize("GIFTDB_ROW_LIMIT", "50")?;
    let enrich_limit = parse_usize("GIFTDB_ENRICH_LIMIT", "20")?;
    let max_concurrency = parse_usize("GIFTDB_MAX_CONCURRENCY", "4")?;

    for (var, value) in [
        ("GIFTDB_MAX_CANDIDATES", max_candidates),
        ("GIFTDB_MAX_CONCURRENCY", max_concurrency),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
    }

    Ok(AppConfig {
        log_level,
        seeds_path,
        primary_provider,
        fallback_order,
        search_api,
        search_api_base_url,
        reader_base_url,
        user_agent,
        request_timeout_secs,
        image_timeout_secs,
        inter_attempt_delay_ms,
        inter_retailer_delay_ms,
        max_candidates,
        retailer_min_results,
        row_limit,
        enrich_limit,
        max_concurrency,
    })
}

fn parse_provider(var: &str, raw: &str) -> Result<ProviderName, ConfigError> {
    raw.parse::<ProviderName>()
        .map_err(|reason| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason,
        })
}

/// Parse a comma-separated provider list. Blank entries are skipped and
/// repeats keep their first position.
fn parse_provider_list(var: &str, raw: &str) -> Result<Vec<ProviderName>, ConfigError> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let name = parse_provider(var, part)?;
        if !out.contains(&name) {
            out.push(name);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
