mod maintenance;
mod report;
mod scrape;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gaswatch")]
#[command(about = "Fuel price snapshots for configured zones")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a zone and write a timestamped snapshot
    Scrape(ScrapeArgs),
    /// Keep only the latest snapshot per location and day
    Reap {
        /// History directory (defaults to GASWATCH_HISTORY_DIR)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Report what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
    },
    /// List the configured regions
    Regions,
}

/// Exactly one of `--region` or `--zip`.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Region key from the region table (see `gaswatch regions`)
    #[arg(long)]
    region: Option<String>,
    /// Center zip for a custom radius zone
    #[arg(long)]
    zip: Option<String>,
}

#[derive(Debug, Args)]
struct ScrapeArgs {
    #[command(flatten)]
    target: Target,
    /// Radius in miles around --zip (defaults to GASWATCH_RADIUS_MILES)
    #[arg(long, requires = "zip")]
    radius: Option<f64>,
    /// Read pre-rendered pages from <DIR>/<zip>.html instead of fetching
    #[arg(long)]
    pages_dir: Option<PathBuf>,
    /// Skip coordinate lookups; Lat/Long columns stay empty
    #[arg(long)]
    no_geocode: bool,
    /// Write files only, without the console report
    #[arg(long)]
    no_report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = gaswatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scrape(args) => scrape::run_scrape(&config, &args).await?,
        Commands::Reap { dir, dry_run } => {
            let dir = dir.unwrap_or_else(|| config.history_dir.clone());
            maintenance::run_reap(&dir, dry_run);
        }
        Commands::Regions => maintenance::run_regions(&config)?,
    }

    Ok(())
}
