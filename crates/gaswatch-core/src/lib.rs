pub mod app_config;
pub mod config;
pub mod records;
pub mod rules;
pub mod zones;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{dedup_records, StationRecord, NO_DISCOUNT_RULE, UNKNOWN_ADDRESS};
pub use rules::{load_rules, BrandRules, Decision, DiscountRule};
pub use zones::{load_regions, Region, RegionTable, Zone, ZipLabels};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config validation failed: {0}")]
    Validation(String),
}
