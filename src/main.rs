use battery_catalog_scraper::unixmagazin::CatalogExtractor;
use battery_catalog_scraper::HttpFetcher;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(version, about = "Scrapes a battery catalog of a web shop into a JSON file")]
struct Args {
    /// Base URL of the shop
    #[arg(long, default_value = "https://y-ola.unixmagazin.ru")]
    base_url: String,

    /// Listing page path, relative to the base URL
    #[arg(long, default_value = "katalog/akb?per-page=all")]
    listing_path: String,

    /// Directory for downloaded item images
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// File the aggregated records are written to
    #[arg(short, long, default_value = "data.json")]
    output: PathBuf,

    /// Pause between items, in seconds
    #[arg(long, default_value_t = 2)]
    pause: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "debug,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let args = Args::parse();

    let fetcher = HttpFetcher::new()?;
    let extractor =
        CatalogExtractor::new(fetcher, &args.base_url, &args.listing_path, args.images_dir)
            .with_detail_pause(Duration::from_secs(args.pause));

    println!("Retrieving...");
    let records = extractor.scrape().await?;
    println!("Retrieved and parsed!");

    if records.is_empty() {
        error!("Data is empty, nothing to save. Probably, something went wrong");
        std::process::exit(1);
    }

    println!("Saving...");
    let payload = serde_json::to_string(&records)?;
    tokio::fs::write(&args.output, payload).await?;
    println!("Done.");

    Ok(())
}
