// src/main.rs
// =============================================================================
// This is the entry point of the CLI.
//
// What happens here:
// 1. Set up logging (tracing, to stderr)
// 2. Parse command-line arguments using clap
// 3. Build the config: defaults -> config file -> flags
// 4. Run a crawl session with the chosen seed source
// 5. Print the report and exit with the verdict
//    (0 = clean, 1 = broken links / failed requests, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CheckOptions, Cli, Commands};
use link_sentinel::checker::HttpTransport;
use link_sentinel::config::CheckConfig;
use link_sentinel::crawl::{
    build_client, CrawlSession, FixedSeeds, HttpLinkSource, SeedSource, SitemapSeeds,
};
use link_sentinel::report::CrawlReport;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so `--json` output on stdout stays machine readable.
// RUST_LOG overrides the default level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("link_sentinel=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Pages { urls, options } => {
            let config = load_config(&options)?;
            if !options.json {
                println!("🔍 Checking links on {} page(s)", urls.len());
            }
            handle_scan(Box::new(FixedSeeds::new(urls)), config, options.json).await
        }
        Commands::Sitemap {
            sitemap_url,
            sample,
            allow_page_errors,
            options,
        } => {
            let mut config = load_config(&options)?;
            if !allow_page_errors {
                config.fail_on_page_errors = true;
            }
            if !options.json {
                println!("🔍 Checking links on pages from {}", sitemap_url);
            }
            let client = build_client(&config)?;
            let mut seeds = SitemapSeeds::new(client, sitemap_url);
            if let Some(size) = sample {
                seeds = seeds.with_sample(size.get(), config.seed);
            }
            handle_scan(Box::new(seeds), config, options.json).await
        }
    }
}

fn load_config(options: &CheckOptions) -> Result<CheckConfig> {
    let mut config = match &options.config {
        Some(path) => CheckConfig::from_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => CheckConfig::default(),
    };
    options.apply(&mut config);
    config.validate()?;
    Ok(config)
}

async fn handle_scan(seeds: Box<dyn SeedSource>, config: CheckConfig, json: bool) -> Result<i32> {
    let client = build_client(&config)?;
    let links = HttpLinkSource::new(client);
    let transport = HttpTransport::new(&config)?;

    let session = CrawlSession::new(config, seeds, Box::new(links), Arc::new(transport))?;
    let report = session.run().await.context("link check session failed")?;

    print_report(&report, json)?;

    Ok(if report.is_clean() { 0 } else { 1 })
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("\n{}", report.render_text());
    println!();
    if report.is_clean() {
        println!("✅ No broken links found");
    } else if report.broken_count > 0 {
        println!("❌ {}", report.summary_message());
    } else if report.failed_count > 0 {
        println!("❌ {} request(s) could not be completed", report.failed_count);
    } else {
        println!("❌ {} page(s) could not be loaded", report.pages_failed);
    }
    Ok(())
}
