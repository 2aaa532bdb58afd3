use std::path::PathBuf;

use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Directory receiving one timestamped snapshot per run.
    pub history_dir: PathBuf,
    /// Directory receiving the `latest_<slug>.csv` pointer files.
    pub latest_dir: PathBuf,
    pub regions_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    /// CSV table backing the radius search; `None` selects the single-zip fallback.
    pub zip_table_path: Option<PathBuf>,
    /// Listing page URL with a `{zip}` placeholder.
    pub page_url_template: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub geocoder_url: String,
    /// Minimum pause before each uncached geocoder lookup.
    pub geocode_delay_ms: u64,
    pub radius_miles: f64,
    /// Zone whose wall clock stamps snapshot file names.
    pub timezone: Tz,
}
