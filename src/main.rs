use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use gbb_scraper::config::HarvestConfig;
use gbb_scraper::constants::OPEN_BREWERY_DB_SOURCE;
use gbb_scraper::images::{ImageDownloader, ImageTask};
use gbb_scraper::logging;
use gbb_scraper::pipeline::{Harvest, HarvestSummary};
use gbb_scraper::scrapers::{self, sites};
use gbb_scraper::storage::InMemoryStore;

#[derive(Parser)]
#[command(name = "gbb-scraper")]
#[command(about = "Great British Beer brewery and beer data harvester")]
#[command(version = "0.1.0")]
struct Cli {
    /// Optional TOML config with rate limits, retry, and image settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest UK breweries from the Open Brewery DB directory
    Breweries {
        /// Cap on breweries fetched
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Harvest beers from known brewery sites (comma-separated source ids)
    Beers {
        /// Source ids to run, e.g. brewery_dark_star,brewery_harveys
        #[arg(long)]
        sites: String,
        /// Cap on beers fetched per site
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Download product images listed in a JSON manifest
    Images {
        /// JSON file with [{"url": ..., "dest": ...}] entries
        #[arg(long)]
        manifest: PathBuf,
        /// Override the configured worker count
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List available source identifiers
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => HarvestConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HarvestConfig::default(),
    };

    match cli.command {
        Commands::Breweries { limit } => {
            let store = Arc::new(InMemoryStore::new());
            let harvest = Harvest::new(store.clone());
            let source = scrapers::create_source(OPEN_BREWERY_DB_SOURCE, &config)
                .context("brewery directory source unavailable")?;

            println!("🍺 Harvesting breweries from Open Brewery DB...");
            let summary = harvest
                .run_breweries(source.as_ref(), limit.or(config.limit))
                .await;
            print_summary("breweries", &summary);
        }
        Commands::Beers { sites: site_list, limit } => {
            if limit.is_some() {
                config.limit = limit;
            }
            let store = Arc::new(InMemoryStore::new());
            let harvest = Harvest::new(store.clone());

            let worklist: Vec<(String, String)> = site_list
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| {
                    let brewery = sites::spec_by_id(id)
                        .map(|spec| spec.brewery_name.to_string())
                        .unwrap_or_else(|| id.to_string());
                    (brewery, id.to_string())
                })
                .collect();

            println!("🍺 Harvesting beers from {} site(s)...", worklist.len());
            let summary = harvest.run_worklist(&worklist, &config).await;
            print_summary("beers", &summary);
            println!(
                "   Stored: {} beers, {} breweries, {} categories",
                store.beer_count().await,
                store.brewery_count().await,
                store.category_count().await
            );
        }
        Commands::Images { manifest, workers } => {
            let raw = std::fs::read_to_string(&manifest)
                .with_context(|| format!("failed to read manifest {}", manifest.display()))?;
            let tasks: Vec<ImageTask> =
                serde_json::from_str(&raw).context("manifest is not a JSON task list")?;

            let downloader = ImageDownloader::new(
                workers.unwrap_or(config.images.max_workers),
                Duration::from_secs(config.images.timeout_secs),
                config.images.max_retries,
            );
            let stats = downloader.download_images(tasks).await;

            println!("\n🖼️  Image download results:");
            println!("   Total: {}", stats.total);
            println!("   Successful: {}", stats.successful);
            println!("   Failed: {}", stats.failed);
        }
        Commands::Sources => {
            println!("Available sources:");
            for id in scrapers::available_sources() {
                println!("   {id}");
            }
            if !scrapers::platform_client_available() {
                warn!("ratings platform disabled at build time");
                println!("   (ratings disabled; rebuild with --features ratings-platform)");
            }
        }
    }

    Ok(())
}

fn print_summary(what: &str, summary: &HarvestSummary) {
    println!("\n📊 Harvest results ({what}):");
    println!("   Found: {}", summary.found);
    println!("   Created: {}", summary.created);
    println!("   Skipped (already stored): {}", summary.skipped);
    println!("   Failed: {}", summary.failed);
}
