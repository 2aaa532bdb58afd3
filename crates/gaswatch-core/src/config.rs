use std::path::PathBuf;

use chrono_tz::Tz;

use crate::app_config::AppConfig;
use crate::ConfigError;

pub(crate) const DEFAULT_PAGE_URL_TEMPLATE: &str = "https://www.gasbuddy.com/home?search={zip}&fuel=1";
pub(crate) const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub(crate) const DEFAULT_TIMEZONE: &str = "America/New_York";
pub(crate) const DEFAULT_USER_AGENT: &str = "gaswatch/0.1 (fuel-price-snapshots)";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
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
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so only malformed values can fail. Decoupled
/// from the process environment so tests can drive it with a plain map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional_path = |var: &str| -> Option<PathBuf> {
        lookup(var)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
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

    let log_level = or_default("GASWATCH_LOG_LEVEL", "info");
    let history_dir = PathBuf::from(or_default("GASWATCH_HISTORY_DIR", "history"));
    let latest_dir = PathBuf::from(or_default("GASWATCH_LATEST_DIR", "."));
    let regions_path = optional_path("GASWATCH_REGIONS_PATH");
    let rules_path = optional_path("GASWATCH_RULES_PATH");
    let zip_table_path = optional_path("GASWATCH_ZIP_TABLE_PATH");

    let page_url_template = or_default("GASWATCH_PAGE_URL_TEMPLATE", DEFAULT_PAGE_URL_TEMPLATE);
    if !page_url_template.contains("{zip}") {
        return Err(invalid(
            "GASWATCH_PAGE_URL_TEMPLATE",
            "template must contain a {zip} placeholder".to_string(),
        ));
    }

    let request_timeout_secs = parse_u64("GASWATCH_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("GASWATCH_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_u32("GASWATCH_MAX_RETRIES", "2")?;
    let retry_backoff_base_secs = parse_u64("GASWATCH_RETRY_BACKOFF_BASE_SECS", "2")?;
    let geocoder_url = or_default("GASWATCH_GEOCODER_URL", DEFAULT_GEOCODER_URL);
    let geocode_delay_ms = parse_u64("GASWATCH_GEOCODE_DELAY_MS", "1100")?;

    let radius_miles = or_default("GASWATCH_RADIUS_MILES", "15")
        .parse::<f64>()
        .map_err(|e| invalid("GASWATCH_RADIUS_MILES", e.to_string()))?;
    if !radius_miles.is_finite() || radius_miles <= 0.0 {
        return Err(invalid(
            "GASWATCH_RADIUS_MILES",
            format!("radius must be a positive number of miles, got {radius_miles}"),
        ));
    }

    let timezone = or_default("GASWATCH_TIMEZONE", DEFAULT_TIMEZONE)
        .parse::<Tz>()
        .map_err(|e| invalid("GASWATCH_TIMEZONE", e.to_string()))?;

    Ok(AppConfig {
        log_level,
        history_dir,
        latest_dir,
        regions_path,
        rules_path,
        zip_table_path,
        page_url_template,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_secs,
        geocoder_url,
        geocode_delay_ms,
        radius_miles,
        timezone,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
