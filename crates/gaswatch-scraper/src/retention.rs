//! History retention: one snapshot per (location, date).
//!
//! Runs independently of scraping. The only coupling is the file name
//! convention `gas_<location>_<YYYY-MM-DD>_<HH-MM>.csv`; anything else in the
//! directory is left alone.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static SNAPSHOT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gas_(.+)_(\d{4}-\d{2}-\d{2})_(\d{2}-\d{2})\.csv$").expect("valid snapshot regex")
});

/// A file that could not be removed (or a directory that could not be read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapSummary {
    /// Snapshot files recognised by name.
    pub scanned: usize,
    /// Newest file of every (location, date) group that had duplicates.
    pub kept: Vec<PathBuf>,
    /// Removed files, or files that would be removed in a dry run.
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<ReapFailure>,
    pub dry_run: bool,
}

impl ReapSummary {
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Parsed snapshot file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotName {
    pub location: String,
    pub date: String,
    pub time: String,
}

#[must_use]
pub fn parse_snapshot_name(file_name: &str) -> Option<SnapshotName> {
    let caps = SNAPSHOT_NAME_RE.captures(file_name)?;
    Some(SnapshotName {
        location: caps.get(1)?.as_str().to_string(),
        date: caps.get(2)?.as_str().to_string(),
        time: caps.get(3)?.as_str().to_string(),
    })
}

/// Deletes every snapshot except the latest of its (location, date) group.
///
/// A missing directory yields an empty summary. Deletion failures are
/// recorded and do not stop the pass. With `dry_run` nothing is removed and
/// [`ReapSummary::deleted`] lists what would have been.
#[must_use]
pub fn reap(history_dir: &Path, dry_run: bool) -> ReapSummary {
    let mut summary = ReapSummary {
        dry_run,
        ..ReapSummary::default()
    };

    let entries = match fs::read_dir(history_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(dir = %history_dir.display(), "history directory missing; nothing to reap");
            return summary;
        }
        Err(e) => {
            tracing::error!(dir = %history_dir.display(), error = %e, "cannot read history directory");
            summary.failures.push(ReapFailure {
                path: history_dir.to_path_buf(),
                error: e.to_string(),
            });
            return summary;
        }
    };

    let paths = entries.map(|entry| entry.map(|e| e.path()));
    let groups = group_snapshots(history_dir, paths, &mut summary);

    for ((location, date), mut files) in groups {
        if files.len() < 2 {
            continue;
        }
        // HH-MM sorts chronologically as text; newest first.
        files.sort_by(|a, b| b.0.cmp(&a.0));
        let mut files = files.into_iter();
        let Some((latest_time, latest)) = files.next() else {
            continue;
        };
        tracing::info!(
            location = %location,
            date = %date,
            keep = %latest_time,
            "keeping latest snapshot"
        );
        summary.kept.push(latest);

        for (_, path) in files {
            if dry_run {
                tracing::info!(path = %path.display(), "would delete");
                summary.deleted.push(path);
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "deleted");
                    summary.deleted.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to delete snapshot");
                    summary.failures.push(ReapFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(
        scanned = summary.scanned,
        deleted = summary.deleted.len(),
        failures = summary.failures.len(),
        dry_run,
        "reap complete"
    );
    summary
}

type SnapshotGroups = BTreeMap<(String, String), Vec<(String, PathBuf)>>;

/// Buckets snapshot paths by (location, date). Entries the directory
/// iterator could not read are recorded as failures against `history_dir`.
fn group_snapshots<I>(history_dir: &Path, paths: I, summary: &mut ReapSummary) -> SnapshotGroups
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut groups = SnapshotGroups::new();
    for path in paths {
        let path = match path {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(dir = %history_dir.display(), error = %e, "unreadable directory entry");
                summary.failures.push(ReapFailure {
                    path: history_dir.to_path_buf(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        let Some(name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_snapshot_name)
        else {
            continue;
        };
        summary.scanned += 1;
        groups
            .entry((name.location, name.date))
            .or_default()
            .push((name.time, path));
    }
    groups
}
