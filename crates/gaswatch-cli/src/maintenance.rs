//! `reap` and `regions` command handlers.

use std::path::Path;

use gaswatch_core::AppConfig;
use gaswatch_scraper::reap;

use crate::scrape::region_table;

/// Deletes superseded snapshots in `dir`. Per-file failures are printed and
/// do not fail the command.
pub(crate) fn run_reap(dir: &Path, dry_run: bool) {
    let summary = reap(dir, dry_run);

    for failure in &summary.failures {
        eprintln!("warning: {}: {}", failure.path.display(), failure.error);
    }
    if summary.scanned == 0 {
        println!("no snapshots found in {}", dir.display());
        return;
    }

    let verb = if dry_run { "would delete" } else { "deleted" };
    for path in &summary.deleted {
        println!("  {verb} {}", path.display());
    }
    println!(
        "scanned {} snapshot(s) in {}: {verb} {}, failed {}",
        summary.scanned,
        dir.display(),
        summary.deleted_count(),
        summary.failures.len()
    );
}

pub(crate) fn run_regions(config: &AppConfig) -> anyhow::Result<()> {
    let table = region_table(config.regions_path.as_deref())?;

    println!("{:<6}{:<40}Zips", "Key", "Name");
    for region in table.regions() {
        println!(
            "{:<6}{:<40}{}",
            region.key,
            region.name,
            region.zips.join(", ")
        );
    }
    Ok(())
}
