//! Campus-Corpus main entry point
//!
//! This is the command-line interface for the Campus-Corpus crawler.

use anyhow::Context;
use campus_corpus::config::{load_config_with_hash, Config, Renderer};
use campus_corpus::crawler::run_crawl;
use campus_corpus::output::{
    count_records, print_corpus_summary, print_statistics, read_records, CorpusSummary, OpenMode,
};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Campus-Corpus: a bounded crawler for institutional websites
///
/// Campus-Corpus walks a fixed list of entry points breadth-first, stays on
/// allow-listed domains, and writes the main text of every page it reaches to a
/// JSON Lines corpus, one record per page.
#[derive(Parser, Debug)]
#[command(name = "campus-corpus")]
#[command(version = "1.0.0")]
#[command(about = "A bounded crawler that builds a text corpus", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Keep the existing corpus and append to it instead of truncating
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    append: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for the existing corpus file and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        let mode = if cli.append {
            OpenMode::Append
        } else {
            OpenMode::Truncate
        };
        handle_crawl(config, mode).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("campus_corpus=info,warn"),
            1 => EnvFilter::new("campus_corpus=debug,info"),
            2 => EnvFilter::new("campus_corpus=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Campus-Corpus Dry Run ===\n");

    let crawler = &config.crawler;
    println!("Crawler Configuration:");
    println!("  Fetch timeout: {}ms", crawler.fetch_timeout_ms);
    println!("  Delay between fetches: {}ms", crawler.rate_limit_delay_ms);
    println!("  Concurrent fetches: {}", crawler.max_concurrent_fetches);
    println!(
        "  Retries: {} (backoff {}ms)",
        crawler.max_retries, crawler.retry_backoff_ms
    );
    println!("  Minimum text length: {}", crawler.min_text_length);
    println!(
        "  Renderer: {}",
        match crawler.renderer {
            Renderer::Http => "http",
            Renderer::Browser => "browser",
        }
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Corpus: {}", config.output.corpus_path);

    println!("\nFilter:");
    println!("  Allowed domains: {}", config.filter.allowed_domains.join(", "));
    println!(
        "  Disallowed query keys: {}",
        config.filter.disallowed_query_keys.join(", ")
    );
    println!(
        "  Excluded paths: {}",
        config.filter.excluded_path_segments.join(", ")
    );

    println!("\nEntry Points ({}):", config.entry_points.len());
    for entry in &config.entry_points {
        println!("  - {} (max depth {})", entry.url, entry.max_depth);
        if !entry.allowed_domains.is_empty() {
            println!("    domains: {}", entry.allowed_domains.join(", "));
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} entry points into {}",
        config.entry_points.len(),
        config.output.corpus_path
    );
}

/// Handles the --stats mode: summarizes the existing corpus file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Corpus: {}\n", config.output.corpus_path);

    let records = read_records(&config.output.corpus_path)?;
    print_corpus_summary(&CorpusSummary::from_records(&records));

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, mode: OpenMode) -> anyhow::Result<()> {
    match mode {
        OpenMode::Truncate => tracing::info!("Starting crawl (corpus will be truncated)"),
        OpenMode::Append => tracing::info!("Starting crawl (appending to existing corpus)"),
    }

    tracing::info!(
        "Entry points: {}, allowed domains: {}",
        config.entry_points.len(),
        config.filter.allowed_domains.len()
    );

    let corpus_path = config.output.corpus_path.clone();

    let stats = match run_crawl(config, mode).await {
        Ok(stats) => {
            tracing::info!("Crawl completed successfully");
            stats
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    println!();
    print_statistics(&stats);

    let records = count_records(&corpus_path)?;
    println!("\n✓ Corpus {} holds {} records", corpus_path, records);

    Ok(())
}
