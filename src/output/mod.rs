//! Output module for the corpus and crawl summaries
//!
//! This module handles:
//! - Streaming page records into the JSON Lines corpus
//! - Reading an existing corpus back
//! - Recording and printing crawl statistics

mod corpus;
pub mod stats;

pub use corpus::{
    count_records, read_records, CorpusWriter, JsonlCorpusWriter, OpenMode, PageRecord,
};
pub use stats::{print_corpus_summary, print_statistics, CorpusSummary, CrawlStats};
