//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Walking entry points one at a time, each with its own BFS
//! - Coordinating fetching, extraction, and link expansion
//! - Politeness delays and bounded retries for transient failures
//! - Streaming records to the corpus as soon as they are extracted
//! - Accumulating per-entry-point and whole-run statistics

use crate::config::{Config, EntryPoint, Renderer};
use crate::crawler::extractor::{ContentExtractor, ExtractOutcome, MainContentExtractor};
use crate::crawler::fetcher::{FetchOutcome, HttpFetcher, PageFetcher};
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::crawler::parser::extract_links;
use crate::output::{CorpusWriter, CrawlStats, JsonlCorpusWriter, OpenMode, PageRecord};
use crate::state::ErrorKind;
use crate::url::{evaluate, normalize_key, AdmissionPolicy};
use crate::CorpusError;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Main crawler coordinator structure
///
/// The coordinator is the single writer of the crawl statistics and the only owner of
/// each entry point's frontier.
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Box<dyn PageFetcher>,
    extractor: Box<dyn ContentExtractor>,
    writer: Box<dyn CorpusWriter>,
    stats: CrawlStats,
}

impl Coordinator {
    /// Creates a new coordinator from its collaborators
    pub fn new(
        config: Config,
        fetcher: Box<dyn PageFetcher>,
        extractor: Box<dyn ContentExtractor>,
        writer: Box<dyn CorpusWriter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            extractor,
            writer,
            stats: CrawlStats::new(),
        }
    }

    /// Statistics accumulated so far over the whole run
    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Runs every entry point in configuration order
    ///
    /// Page-level failures are counted and never returned. The only error is a fatal
    /// one (a record that could not be persisted, or an entry point that cannot be
    /// crawled at all); everything written before it stays in the corpus.
    pub async fn run(&mut self) -> Result<CrawlStats, CorpusError> {
        let config = Arc::clone(&self.config);
        let start_time = Instant::now();

        tracing::info!(
            "Starting crawl of {} entry points",
            config.entry_points.len()
        );

        for (idx, entry) in config.entry_points.iter().enumerate() {
            tracing::info!(
                "Entry point {}/{}: {} (max depth {})",
                idx + 1,
                config.entry_points.len(),
                entry.url,
                entry.max_depth
            );

            let mut entry_stats = CrawlStats::new();
            let result = self.crawl_entry_point(entry, &mut entry_stats).await;

            entry_stats.log_summary(&entry.url);
            self.stats.absorb(&entry_stats);

            if let Err(e) = result {
                tracing::error!("Aborting crawl: {}", e);
                self.stats.log_summary("Run (aborted)");
                return Err(e);
            }
        }

        tracing::info!("Crawl completed in {:?}", start_time.elapsed());
        self.stats.log_summary("Run");

        Ok(self.stats.clone())
    }

    /// Runs the BFS of one entry point
    async fn crawl_entry_point(
        &mut self,
        entry: &EntryPoint,
        stats: &mut CrawlStats,
    ) -> Result<(), CorpusError> {
        let mut frontier = Frontier::new(&entry.url, entry.max_depth)?;
        let policy = AdmissionPolicy::for_entry_point(&self.config, entry);
        let concurrency = self.config.crawler.max_concurrent_fetches.max(1) as usize;

        if concurrency == 1 {
            while let Some(task) = frontier.pop() {
                self.politeness_delay().await;
                let (outcome, retries) = self.fetch_with_retry(&task.url).await;
                stats.record_retries(retries);

                self.process_outcome(&task, outcome, &mut frontier, &policy, entry, stats)?;
                self.report_progress(stats, &frontier);
            }
        } else {
            loop {
                let level = frontier.take_level();
                if level.is_empty() {
                    break;
                }

                tracing::debug!(
                    "Fetching {} pages at depth {} ({} at a time)",
                    level.len(),
                    level[0].depth,
                    concurrency
                );

                let outcomes: Vec<(FetchOutcome, u32)> = {
                    let this = &*self;
                    stream::iter(level.iter().map(|task| async move {
                        this.politeness_delay().await;
                        this.fetch_with_retry(&task.url).await
                    }))
                    .buffered(concurrency)
                    .collect()
                    .await
                };

                for (task, (outcome, retries)) in level.iter().zip(outcomes) {
                    stats.record_retries(retries);
                    self.process_outcome(task, outcome, &mut frontier, &policy, entry, stats)?;
                    self.report_progress(stats, &frontier);
                }
            }
        }

        Ok(())
    }

    /// Fetches a URL, retrying timeouts and network errors up to `max-retries` times
    ///
    /// Returns the final outcome and the number of retries made.
    async fn fetch_with_retry(&self, url: &str) -> (FetchOutcome, u32) {
        let crawler = &self.config.crawler;
        let timeout = Duration::from_millis(crawler.fetch_timeout_ms);
        let mut attempt = 0;

        loop {
            tracing::debug!("Fetching {}", url);
            let outcome = self.fetcher.fetch(url, timeout).await;

            let transient = outcome.error_kind().map_or(false, |kind| kind.is_transient());
            if !transient || attempt >= crawler.max_retries {
                return (outcome, attempt);
            }

            let backoff = retry_backoff(crawler.retry_backoff_ms, attempt);
            attempt += 1;
            tracing::debug!(
                "Retrying {} in {:?} (attempt {} of {}): {:?}",
                url,
                backoff,
                attempt,
                crawler.max_retries,
                outcome
            );
            tokio::time::sleep(backoff).await;
        }
    }

    /// Handles one fetched page: count, extract, persist, expand
    fn process_outcome(
        &mut self,
        task: &CrawlTask,
        outcome: FetchOutcome,
        frontier: &mut Frontier,
        policy: &AdmissionPolicy,
        entry: &EntryPoint,
        stats: &mut CrawlStats,
    ) -> Result<(), CorpusError> {
        stats.record_visit();

        let (final_url, markup) = match outcome {
            FetchOutcome::Success { final_url, markup } => (final_url, markup),
            failure => {
                log_fetch_failure(&task.url, &failure);
                if let Some(kind) = failure.error_kind() {
                    stats.record_error(kind);
                }
                return Ok(());
            }
        };

        if final_url != task.url {
            let verdict = evaluate(&final_url, policy, task.depth);
            if !verdict.is_admitted() {
                tracing::debug!(
                    "Dropping {}: redirected to {} ({})",
                    task.url,
                    final_url,
                    verdict
                );
                stats.record_rejected();
                return Ok(());
            }
            frontier.mark_visited(&final_url);
        }

        let content = match self.extractor.extract(&markup) {
            ExtractOutcome::Extracted(content) => content,
            ExtractOutcome::Failed(reason) => {
                tracing::warn!("No content extracted from {}: {}", task.url, reason);
                stats.record_error(ErrorKind::ExtractionFailed);

                // Links are still expanded from the raw markup
                if frontier.can_expand(task) {
                    self.expand(task, &final_url, &markup, frontier, policy, stats);
                }
                return Ok(());
            }
        };

        let record = PageRecord {
            url: task.url.clone(),
            title: content.title.unwrap_or_else(|| task.url.clone()),
            text_content: content.text,
            extracted_at: Utc::now(),
            depth: task.depth,
            source_entry_point: entry.url.clone(),
        };
        self.writer.append(&record)?;
        stats.record_extracted();

        tracing::debug!(
            "Extracted {} (depth {}, {} characters)",
            task.url,
            task.depth,
            record.text_content.chars().count()
        );

        if frontier.can_expand(task) {
            self.expand(task, &final_url, &markup, frontier, policy, stats);
        }

        Ok(())
    }

    /// Offers every admitted link of a page to the frontier
    fn expand(
        &self,
        task: &CrawlTask,
        final_url: &str,
        markup: &str,
        frontier: &mut Frontier,
        policy: &AdmissionPolicy,
        stats: &mut CrawlStats,
    ) {
        let base_url = match Url::parse(final_url).or_else(|_| Url::parse(&task.url)) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Cannot resolve links of {}: {}", task.url, e);
                return;
            }
        };

        let child_depth = task.depth + 1;
        let mut enqueued = 0;

        for link in extract_links(markup, &base_url) {
            // Admission sees the same form the visited set stores
            let key = match normalize_key(&link) {
                Some(key) => key,
                None => {
                    tracing::trace!("Rejected {}: cannot be normalized", link);
                    stats.record_rejected();
                    continue;
                }
            };

            let verdict = evaluate(&key, policy, child_depth);
            if !verdict.is_admitted() {
                tracing::trace!("Rejected {}: {}", link, verdict);
                stats.record_rejected();
                continue;
            }

            if frontier.offer(&key, task) {
                enqueued += 1;
            }
        }

        tracing::debug!(
            "Found {} new links on {} (queue: {})",
            enqueued,
            task.url,
            frontier.len()
        );
    }

    async fn politeness_delay(&self) {
        let delay = self.config.crawler.rate_limit_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    fn report_progress(&self, stats: &CrawlStats, frontier: &Frontier) {
        if stats.visited > 0 && stats.visited % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} pages visited, {} extracted, {} in frontier",
                stats.visited,
                stats.extracted,
                frontier.len()
            );
        }
    }
}

/// Exponential backoff: `base`, `2 * base`, `4 * base`, ...
fn retry_backoff(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(1u64 << attempt.min(16)))
}

fn log_fetch_failure(url: &str, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Timeout => tracing::warn!("Timed out fetching {}", url),
        FetchOutcome::HttpError { status } => tracing::warn!("HTTP {} for {}", status, url),
        FetchOutcome::NetworkError { message } => {
            tracing::warn!("Network error fetching {}: {}", url, message)
        }
        FetchOutcome::UnsupportedContentType { content_type } => {
            tracing::info!("Skipping {}: not an HTML page ({})", url, content_type)
        }
        FetchOutcome::Success { .. } => {}
    }
}

/// Runs the main crawl operation
///
/// This function wires the configured collaborators together:
///
/// 1. Open the corpus file (truncating it, or repairing it in append mode)
/// 2. Build the page fetcher for the configured renderer
/// 3. Build the main-content extractor
/// 4. Crawl every entry point in order
///
/// # Example
///
/// ```no_run
/// use campus_corpus::config::load_config;
/// use campus_corpus::crawler::run_crawl;
/// use campus_corpus::output::OpenMode;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let stats = run_crawl(config, OpenMode::Truncate).await?;
/// println!("{} records written", stats.extracted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, mode: OpenMode) -> Result<CrawlStats, CorpusError> {
    let writer = JsonlCorpusWriter::open(&config.output.corpus_path, mode)?;
    let fetcher = build_fetcher(&config).await?;
    let extractor = MainContentExtractor::new(config.crawler.min_text_length);

    let mut coordinator = Coordinator::new(config, fetcher, Box::new(extractor), Box::new(writer));
    coordinator.run().await
}

async fn build_fetcher(config: &Config) -> Result<Box<dyn PageFetcher>, CorpusError> {
    match config.crawler.renderer {
        Renderer::Http => Ok(Box::new(HttpFetcher::new(&config.user_agent)?)),
        #[cfg(feature = "browser")]
        Renderer::Browser => Ok(Box::new(
            crate::crawler::fetcher::BrowserFetcher::launch(&config.user_agent).await?,
        )),
        #[cfg(not(feature = "browser"))]
        Renderer::Browser => Err(crate::ConfigError::Validation(
            "renderer = \"browser\" requires building with the `browser` feature".to_string(),
        )
        .into()),
    }
}
