//! Sumi-Scribe main entry point
//!
//! This is the command-line interface for the Sumi-Scribe site crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use sumi_scribe::config::{compute_config_hash, parse_byte_size, read_config, validate, Config};
use sumi_scribe::crawler::{prepare_seeds, run_crawl};
use sumi_scribe::output::{load_statistics, print_statistics, summarize_records};
use sumi_scribe::url::CrawlScope;
use tracing_subscriber::EnvFilter;

/// Sumi-Scribe: a polite, resumable site crawler
///
/// Sumi-Scribe crawls one site breadth-first while respecting robots.txt and
/// per-host rate limits, and stores every HTML page as Markdown together with
/// an append-only outcome log.
#[derive(Parser, Debug)]
#[command(name = "sumi-scribe")]
#[command(version = "1.0.0")]
#[command(about = "A polite, resumable site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed URL to crawl; repeat for multiple seeds (replaces configured seeds)
    #[arg(long = "start-url", value_name = "URL")]
    start_urls: Vec<String>,

    /// Directory for Markdown pages and metadata
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Stop after writing this many Markdown bytes (e.g. 5GB, 512K)
    #[arg(long, value_name = "SIZE", value_parser = parse_size_arg)]
    max_bytes: Option<u64>,

    /// Stop after this many HTML pages (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_pages: Option<u64>,

    /// Delay between requests to the same host (seconds)
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// User-Agent to send with requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Include subdomains of the base host
    #[arg(long)]
    include_subdomains: bool,

    /// Disable sitemap seeding from robots.txt
    #[arg(long)]
    no_sitemaps: bool,

    /// Extra sitemap URL to seed from; repeatable
    #[arg(long = "sitemap", value_name = "URL")]
    sitemaps: Vec<String>,

    /// Upper bound on URLs taken from sitemaps
    #[arg(long, value_name = "N")]
    max_sitemap_urls: Option<usize>,

    /// Resume from the existing meta.jsonl in the output directory
    #[arg(long)]
    resume: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for the output directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

fn parse_size_arg(value: &str) -> Result<u64, String> {
    parse_byte_size(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    // Handle different modes
    if cli.stats {
        handle_stats(&config)
    } else {
        validate(&config).context("Invalid configuration")?;
        if cli.dry_run {
            handle_dry_run(&config)
        } else {
            handle_crawl(config).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scribe=info,warn"),
            1 => EnvFilter::new("sumi_scribe=debug,info"),
            2 => EnvFilter::new("sumi_scribe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and layers command-line flags on top
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let config = read_config(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let hash = compute_config_hash(path)?;
            tracing::info!("Configuration loaded (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let crawler = &mut config.crawler;
    if !cli.start_urls.is_empty() {
        crawler.start_urls = cli.start_urls.clone();
    }
    if let Some(max_bytes) = cli.max_bytes {
        crawler.max_bytes = max_bytes;
    }
    if let Some(max_pages) = cli.max_pages {
        crawler.max_pages = max_pages;
    }
    if let Some(delay) = cli.delay {
        crawler.delay = delay;
    }
    if let Some(user_agent) = &cli.user_agent {
        crawler.user_agent = user_agent.clone();
    }
    if let Some(timeout) = cli.timeout {
        crawler.timeout = timeout;
    }
    if cli.include_subdomains {
        crawler.include_subdomains = true;
    }
    if cli.no_sitemaps {
        crawler.use_sitemaps = false;
    }
    crawler.sitemaps.extend(cli.sitemaps.iter().cloned());
    if cli.max_sitemap_urls.is_some() {
        crawler.max_sitemap_urls = cli.max_sitemap_urls;
    }
    if cli.resume {
        crawler.resume = true;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }

    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<()> {
    let crawler = &config.crawler;
    let seeds = prepare_seeds(&crawler.start_urls)?;
    let scope = seeds
        .first()
        .and_then(|seed| CrawlScope::from_url(seed, crawler.include_subdomains))
        .context("First seed has no host")?;

    println!("=== Sumi-Scribe Dry Run ===\n");

    println!("Scope:");
    println!("  Base host: {}", scope.base_host());
    println!("  Include subdomains: {}", scope.include_subdomains());

    println!("\nSeeds ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {}", seed);
    }

    println!("\nCrawler Configuration:");
    println!("  Max bytes: {}", crawler.max_bytes);
    if crawler.max_pages == 0 {
        println!("  Max pages: unlimited");
    } else {
        println!("  Max pages: {}", crawler.max_pages);
    }
    println!("  Delay: {}s", crawler.delay);
    println!("  Timeout: {}s", crawler.timeout);
    println!("  User agent: {}", crawler.user_agent);
    println!("  Sitemaps: {}", if crawler.use_sitemaps { "on" } else { "off" });
    for sitemap in &crawler.sitemaps {
        println!("    * {}", sitemap);
    }
    if let Some(max) = crawler.max_sitemap_urls {
        println!("  Max sitemap URLs: {}", max);
    }
    println!("  Resume: {}", crawler.resume);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URLs", seeds.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics for the output directory
fn handle_stats(config: &Config) -> Result<()> {
    let dir = &config.output.directory;
    println!("Output directory: {}\n", dir.display());

    let stats = load_statistics(dir).context("Failed to read stats.json")?;
    let records = summarize_records(dir).context("Failed to read meta.jsonl")?;

    print_statistics(stats.as_ref(), &records);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<()> {
    tracing::info!(
        "Seeds: {}, max bytes: {}, max pages: {}, delay: {}s",
        config.crawler.start_urls.len(),
        config.crawler.max_bytes,
        config.crawler.max_pages,
        config.crawler.delay
    );

    let stats = run_crawl(config).await.context("Crawl failed")?;
    tracing::info!("Crawl completed: {}", stats.stop_reason);

    Ok(())
}
