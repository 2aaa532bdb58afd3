//! Listing-page extraction and snapshot files.
//!
//! Pages come in through a [`PageSource`]; [`SnapshotBuilder`] turns each
//! zip's page into station records; [`export`] writes them and
//! [`retention`] prunes the history directory.

pub mod address;
pub mod card;
pub mod dom;
pub mod error;
pub mod export;
pub mod nearby;
pub mod page;
pub mod price;
pub(crate) mod rate_limit;
pub mod retention;
pub mod snapshot;

pub use card::CardLocator;
pub use error::{ExportError, ScraperError, SnapshotError};
pub use export::{export_snapshot, ExportPaths};
pub use nearby::{radius_zone, NearbyZips, NearbyZone, SingleZipFallback, ZipTableSearch};
pub use page::{DirectoryPageSource, HttpPageSource, PageSource};
pub use retention::{reap, ReapSummary};
pub use snapshot::{scan_page, SnapshotBuilder, SnapshotOutcome, ZipReport};
