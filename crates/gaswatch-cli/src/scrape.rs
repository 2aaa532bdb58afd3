//! `scrape` command handler.
//!
//! Resolves the target zone, builds the snapshot through the scraper crate,
//! writes the CSV pair and prints the console report.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use gaswatch_core::zones::is_valid_zip;
use gaswatch_core::{load_regions, load_rules, AppConfig, BrandRules, RegionTable, Zone, ZipLabels};
use gaswatch_geocode::{GeoResolver, Geocoder, NominatimClient, NullGeocoder};
use gaswatch_scraper::{
    export_snapshot, radius_zone, DirectoryPageSource, HttpPageSource, NearbyZips, PageSource,
    ScraperError, SingleZipFallback, SnapshotBuilder, SnapshotOutcome, ZipTableSearch,
};

use crate::report::render_report;
use crate::ScrapeArgs;

/// Where zone pages come from for this run.
enum Pages {
    Dir(DirectoryPageSource),
    Http(HttpPageSource),
}

impl PageSource for Pages {
    async fn fetch_page(&self, zip: &str) -> Result<String, ScraperError> {
        match self {
            Self::Dir(source) => source.fetch_page(zip).await,
            Self::Http(source) => source.fetch_page(zip).await,
        }
    }
}

pub(crate) async fn run_scrape(config: &AppConfig, args: &ScrapeArgs) -> anyhow::Result<()> {
    let (zone, labels) = resolve_zone(config, args)?;
    let rules = match &config.rules_path {
        Some(path) => load_rules(path)?,
        None => BrandRules::default(),
    };
    let pages = match &args.pages_dir {
        Some(dir) => Pages::Dir(DirectoryPageSource::new(dir)),
        None => Pages::Http(
            HttpPageSource::new(
                &config.page_url_template,
                config.request_timeout_secs,
                &config.user_agent,
                config.max_retries,
                config.retry_backoff_base_secs,
            )
            .context("failed to build page fetcher")?,
        ),
    };

    tracing::info!(zone = %zone.name, zips = zone.zips.len(), "starting scrape");

    let outcome = if args.no_geocode {
        collect(&zone, &labels, &rules, &pages, NullGeocoder, Duration::ZERO).await?
    } else {
        let geocoder = NominatimClient::new(
            &config.geocoder_url,
            config.request_timeout_secs,
            &config.user_agent,
        )
        .context("failed to build geocoding client")?;
        let delay = Duration::from_millis(config.geocode_delay_ms);
        collect(&zone, &labels, &rules, &pages, geocoder, delay).await?
    };

    for report in outcome.zips_without_data() {
        match &report.page_error {
            Some(error) => eprintln!("warning: {} ({}): {error}", report.label, report.zip),
            None => eprintln!("warning: {} ({}): no listings", report.label, report.zip),
        }
    }

    if outcome.is_empty() {
        println!("no data found for {}", zone.name);
        return Ok(());
    }

    let paths = export_snapshot(
        &outcome.records,
        &zone.slug(),
        &config.history_dir,
        &config.latest_dir,
        snapshot_time(Utc::now(), config.timezone),
    )?;

    tracing::info!(
        records = outcome.records.len(),
        duplicates = outcome.duplicates_dropped,
        history = %paths.history.display(),
        "snapshot written"
    );

    if !args.no_report {
        print!("{}", render_report(&outcome.records));
    }
    println!(
        "{} station(s) saved to {} and {}",
        outcome.records.len(),
        paths.history.display(),
        paths.latest.display()
    );

    Ok(())
}

/// Runs the snapshot with one geocoder backend and logs resolver statistics.
async fn collect<G: Geocoder>(
    zone: &Zone,
    labels: &ZipLabels,
    rules: &BrandRules,
    pages: &Pages,
    geocoder: G,
    delay: Duration,
) -> anyhow::Result<SnapshotOutcome> {
    let mut resolver = GeoResolver::new(geocoder, delay);
    let outcome = SnapshotBuilder::new(rules, &mut resolver)
        .build_snapshot(zone, labels, pages)
        .await?;

    let stats = resolver.stats();
    tracing::info!(
        cache_hits = stats.cache_hits,
        misses = stats.misses,
        queries = stats.queries,
        failures = stats.failures,
        not_found = stats.not_found,
        "geocoding finished"
    );
    Ok(outcome)
}

/// Turns `--region` or `--zip` into a zone and the labels its records use.
pub(crate) fn resolve_zone(
    config: &AppConfig,
    args: &ScrapeArgs,
) -> anyhow::Result<(Zone, ZipLabels)> {
    let table = region_table(config.regions_path.as_deref())?;

    if let Some(key) = &args.target.region {
        let Some(region) = table.get(key) else {
            let known: Vec<&str> = table.regions().iter().map(|r| r.key.as_str()).collect();
            anyhow::bail!("unknown region {key:?} (known: {})", known.join(", "));
        };
        return Ok((region.to_zone(), table.labels().clone()));
    }

    let Some(center) = args.target.zip.as_deref() else {
        anyhow::bail!("either --region or --zip is required");
    };
    if !is_valid_zip(center) {
        anyhow::bail!("invalid zip {center:?}: expected five digits");
    }
    let radius = args.radius.unwrap_or(config.radius_miles);
    if !radius.is_finite() || radius <= 0.0 {
        anyhow::bail!("radius must be a positive number of miles, got {radius}");
    }

    let finder: Box<dyn NearbyZips> = match &config.zip_table_path {
        Some(path) => Box::new(
            ZipTableSearch::load(path)
                .with_context(|| format!("failed to load zip table {}", path.display()))?,
        ),
        None => Box::new(SingleZipFallback),
    };
    let (zone, found) = radius_zone(finder.as_ref(), center, radius);

    let mut labels = table.labels().clone();
    labels.merge(found);
    Ok((zone, labels))
}

/// The YAML region table when configured, otherwise the built-in one.
pub(crate) fn region_table(path: Option<&Path>) -> anyhow::Result<RegionTable> {
    match path {
        Some(path) => Ok(load_regions(path)?),
        None => Ok(RegionTable::builtin()),
    }
}

/// Wall-clock time in `tz`, so file names and retention groups do not depend
/// on the host clock's zone.
#[must_use]
pub(crate) fn snapshot_time(now: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    now.with_timezone(&tz).naive_local()
}
