use crate::app_config::{AppConfig, Disclosure, Environment};
use crate::venue::{Coordinate, MergePolicy};
use crate::ConfigError;

pub(crate) const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
pub(crate) const DEFAULT_MAPS_SCRIPT_URL: &str = "https://maps.googleapis.com/maps/api/js";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
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
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The API key is optional here. A missing key is reported as
/// `ConfigurationMissing` when a run is about to start, not at boot.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("VENUESCOUT_ENV", "development"));

    let bind_addr = or_default("VENUESCOUT_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("VENUESCOUT_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("VENUESCOUT_LOG_LEVEL", "info");

    let places_api_key = lookup("GOOGLE_MAPS_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let places_base_url = or_default("VENUESCOUT_PLACES_BASE_URL", DEFAULT_PLACES_BASE_URL);
    let maps_script_url = or_default("VENUESCOUT_MAPS_SCRIPT_URL", DEFAULT_MAPS_SCRIPT_URL);

    let center = or_default("VENUESCOUT_CENTER", "-33.9249,18.4241")
        .parse::<Coordinate>()
        .map_err(|reason| invalid("VENUESCOUT_CENTER", reason))?;
    let city = or_default("VENUESCOUT_CITY", "Cape Town");
    let search_radius_m = parse_u32("VENUESCOUT_SEARCH_RADIUS_M", "35000")?;

    let request_timeout_secs = parse_u64("VENUESCOUT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("VENUESCOUT_USER_AGENT", "venuescout/0.1 (venue-discovery)");
    let max_retries = parse_u32("VENUESCOUT_MAX_RETRIES", "0")?;
    let retry_backoff_base_ms = parse_u64("VENUESCOUT_RETRY_BACKOFF_BASE_MS", "500")?;

    let inter_page_delay_ms = parse_u64("VENUESCOUT_INTER_PAGE_DELAY_MS", "2000")?;
    let max_pages = match parse_u32("VENUESCOUT_MAX_PAGES", "3")? {
        0 => None,
        n => Some(n),
    };
    let max_records = parse_usize("VENUESCOUT_MAX_RECORDS", "60")?;
    if max_records == 0 {
        return Err(invalid("VENUESCOUT_MAX_RECORDS", "must be at least 1".to_string()));
    }
    let detail_batch_size = parse_usize("VENUESCOUT_DETAIL_BATCH_SIZE", "5")?;
    if detail_batch_size == 0 {
        return Err(invalid(
            "VENUESCOUT_DETAIL_BATCH_SIZE",
            "must be at least 1".to_string(),
        ));
    }

    let merge_policy = parse_merge_policy(&or_default("VENUESCOUT_MERGE_POLICY", "replace"))
        .map_err(|reason| invalid("VENUESCOUT_MERGE_POLICY", reason))?;
    let disclosure = parse_disclosure(&or_default("VENUESCOUT_DISCLOSURE", "progressive"))
        .map_err(|reason| invalid("VENUESCOUT_DISCLOSURE", reason))?;

    let photo_max_width = parse_u32("VENUESCOUT_PHOTO_MAX_WIDTH", "400")?;
    let categories_path = lookup("VENUESCOUT_CATEGORIES_PATH").ok().map(PathBuf::from);

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        places_api_key,
        places_base_url,
        maps_script_url,
        center,
        city,
        search_radius_m,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        inter_page_delay_ms,
        max_pages,
        max_records,
        detail_batch_size,
        merge_policy,
        disclosure,
        photo_max_width,
        categories_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_merge_policy(s: &str) -> Result<MergePolicy, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "replace" => Ok(MergePolicy::Replace),
        "patch" => Ok(MergePolicy::Patch),
        other => Err(format!("expected \"replace\" or \"patch\", got \"{other}\"")),
    }
}

fn parse_disclosure(s: &str) -> Result<Disclosure, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "progressive" => Ok(Disclosure::Progressive),
        "terminal" => Ok(Disclosure::Terminal),
        other => Err(format!(
            "expected \"progressive\" or \"terminal\", got \"{other}\""
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
