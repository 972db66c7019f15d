//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page fetching over HTTP or through a headless browser
//! - Link discovery and main-content extraction
//! - The per-entry-point BFS frontier
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{ContentExtractor, ExtractOutcome, ExtractedContent, MainContentExtractor};
#[cfg(feature = "browser")]
pub use fetcher::BrowserFetcher;
pub use fetcher::{build_http_client, is_html_content_type, FetchOutcome, HttpFetcher, PageFetcher};
pub use frontier::{CrawlTask, Frontier};
pub use parser::extract_links;

use crate::config::Config;
use crate::output::{CrawlStats, OpenMode};
use crate::CorpusError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the corpus file, truncating any previous contents
/// 2. Build the page fetcher
/// 3. Crawl each entry point breadth-first, in order
/// 4. Return the run statistics
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl completed; page failures are counted in the stats
/// * `Err(CorpusError)` - Crawl aborted on a fatal error
pub async fn crawl(config: Config) -> Result<CrawlStats, CorpusError> {
    run_crawl(config, OpenMode::Truncate).await
}
