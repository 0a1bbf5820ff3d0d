//! Campus-Archiver main entry point
//!
//! This is the command-line interface for the campus-site archiver.

use campus_archiver::config::{read_config, validate, CrawlConfig, RenderEngine};
use campus_archiver::crawler::crawl;
use campus_archiver::logging;
use campus_archiver::output::print_report;
use campus_archiver::ScopeValidator;
use clap::Parser;
use std::path::PathBuf;

/// Campus-Archiver: a bounded campus-site crawler
///
/// Campus-Archiver crawls one campus website, renders every unique page to
/// PDF grouped by campus, downloads linked PDF files and writes a JSON
/// report of the run.
#[derive(Parser, Debug)]
#[command(name = "campus-archiver")]
#[command(version = "1.0.0")]
#[command(about = "A bounded campus-site crawler that archives pages as PDF", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Seed URL to start from (repeatable; replaces the configured seeds)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// PDF rendering engine
    #[arg(long, value_enum)]
    engine: Option<RenderEngine>,

    /// Root directory for PDFs and reports
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Ceiling on unique URLs crawled
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum link depth from the seeds
    #[arg(long)]
    max_depth: Option<u32>,

    /// Directory of the DEBUG-level log file
    #[arg(long, value_name = "DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Log to the console only
    #[arg(long)]
    no_log_file: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Flushes the log file when main returns
    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    let _log_guard = logging::init(cli.verbose, cli.quiet, log_dir);

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Reads the config file (if any), applies command-line overrides and
/// validates the merged result
fn load(cli: &Cli) -> Result<CrawlConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = read_config(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            CrawlConfig::default()
        }
    };

    if !cli.seeds.is_empty() {
        config.crawler.seed_urls = cli.seeds.clone();
    }
    if let Some(engine) = cli.engine {
        config.render.engine = engine;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.output_dir = dir.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }

    validate(&config)?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &CrawlConfig) {
    println!("=== Campus-Archiver Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!(
        "  Delay between batches: {}s",
        config.crawler.delay_between_requests
    );
    println!("  Max retries: {}", config.crawler.max_retries);
    println!(
        "  Respect robots.txt: {}",
        config.crawler.respect_robots_txt
    );
    println!("  User agent: {}", config.crawler.user_agent);

    println!(
        "\nIn-scope Domains ({}):",
        config.scope.in_scope_domains.len()
    );
    for domain in &config.scope.in_scope_domains {
        println!("  - {}", domain);
    }

    println!("\nRendering:");
    println!("  Engine: {:?}", config.render.engine);
    println!("  Page size: {}", config.render.page_size);
    println!("  Margin: {}", config.render.margin);
    println!("  Include images: {}", config.render.include_images);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.output_dir.display());
    println!(
        "  Download linked PDFs: {}",
        config.output.download_existing_pdfs
    );
    println!("  Group pages by campus: {}", config.output.group_by_campus);

    let scope = ScopeValidator::new(&config.scope);
    let seeds = config.crawler.effective_seeds();
    println!("\nSeeds ({}):", seeds.len());
    for seed in &seeds {
        if scope.is_valid(seed) {
            println!("  * {}", seed);
        } else {
            println!("  * {} (out of scope, will be skipped)", seed);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation; Ctrl-C ends the run early with a report
async fn handle_crawl(config: CrawlConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Crawling {} (max {} pages, depth {})",
        config.crawler.base_url,
        config.crawler.max_pages,
        config.crawler.max_depth
    );

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl-C, finishing current work");
        } else {
            // No signal handler; never interrupt
            std::future::pending::<()>().await;
        }
    };

    match crawl(config, shutdown).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to start crawler: {}", e);
            Err(e.into())
        }
    }
}
