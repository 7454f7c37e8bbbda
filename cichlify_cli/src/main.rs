mod output;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use cichlify_lib::{
    AggregatedDataset, AmazonExtractor, EbayExtractor, ProductScraper, RetryPolicy, ScrapeConfig,
    SourceExtractor,
};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "cichlify")]
#[command(about = "Scrape and analyze product prices across marketplaces")]
struct Cli {
    /// Product search term
    search_term: String,

    /// Pages to fetch per source
    #[arg(long, default_value = "2")]
    pages: u32,

    /// Retry attempts per page
    #[arg(long, default_value = "3")]
    retries: usize,

    /// Base politeness/backoff delay in milliseconds
    #[arg(long, default_value = "2000")]
    delay_ms: u64,

    /// Future price ranks to project
    #[arg(long, default_value = "5")]
    horizon: usize,

    /// Fetch every source over plain HTTP, without a headless browser
    #[arg(long)]
    no_browser: bool,

    /// Output format: table or json
    #[arg(long, default_value = "table")]
    output: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cichlify_lib=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    let mut config = ScrapeConfig::new(&cli.search_term);
    config.max_pages = cli.pages;
    config.retry = RetryPolicy {
        max_retries: cli.retries,
        base_delay: Duration::from_millis(cli.delay_ms),
    };
    config.use_browser = !cli.no_browser;

    let extractors: Vec<Box<dyn SourceExtractor>> = vec![
        Box::new(AmazonExtractor::new()),
        Box::new(EbayExtractor::new()),
    ];
    let scraper = ProductScraper::new(config, extractors)?;
    let source_sets = scraper.scrape_all().await;
    // Release the browser before reporting; it is a live external process.
    drop(scraper);

    let dataset = AggregatedDataset::build(source_sets);
    output::print_report(&dataset, cli.horizon, &format)?;

    Ok(())
}
