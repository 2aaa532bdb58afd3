use std::path::PathBuf;

use thiserror::Error;

/// Failures while obtaining a zip's page or the nearby-zip table.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response was an interstitial challenge page instead of listings.
    #[error("bot challenge served by {url}")]
    BotChallenge { url: String },

    #[error("invalid page URL template \"{template}\": {reason}")]
    InvalidUrlTemplate { template: String, reason: String },

    #[error("failed to read page {}: {source}", path.display())]
    PageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read zip table {}: {source}", path.display())]
    ZipTable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("zone \"{name}\" has no zip codes")]
    EmptyZone { name: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error writing {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
