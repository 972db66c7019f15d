//! Crawl statistics
//!
//! This module provides the counters the coordinator accumulates while crawling and
//! the summaries printed for a finished run or an existing corpus file.

use crate::output::PageRecord;
use crate::state::ErrorKind;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters for one entry point or a whole run
///
/// Owned and mutated by the coordinator alone; per-entry-point stats are folded into the
/// run total with [`CrawlStats::absorb`]. Counters only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// URLs dequeued and fetched (retries not included)
    pub visited: u64,

    /// Records written to the corpus
    pub extracted: u64,

    /// Page failures, excluding binary documents
    pub errors: u64,

    /// Every page failure by kind, binary documents included
    pub errors_by_kind: BTreeMap<ErrorKind, u64>,

    /// Discovered links refused by the admission filter
    pub rejected: u64,

    /// Extra fetch attempts made for transient failures
    pub retries: u64,
}

impl CrawlStats {
    /// Creates empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_visit(&mut self) {
        self.visited += 1;
    }

    pub fn record_extracted(&mut self) {
        self.extracted += 1;
    }

    /// Counts a page failure under its kind
    ///
    /// Kinds that do not count as errors (binary documents) only show up in
    /// `errors_by_kind`.
    pub fn record_error(&mut self, kind: ErrorKind) {
        *self.errors_by_kind.entry(kind).or_insert(0) += 1;
        if kind.counts_as_error() {
            self.errors += 1;
        }
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Counts the extra attempts made for one URL
    pub fn record_retries(&mut self, retries: u32) {
        self.retries += u64::from(retries);
    }

    /// Number of failures of one kind
    pub fn errors_of(&self, kind: ErrorKind) -> u64 {
        self.errors_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Adds another set of counters into this one
    pub fn absorb(&mut self, other: &CrawlStats) {
        self.visited += other.visited;
        self.extracted += other.extracted;
        self.errors += other.errors;
        self.rejected += other.rejected;
        self.retries += other.retries;

        for (kind, count) in &other.errors_by_kind {
            *self.errors_by_kind.entry(*kind).or_insert(0) += count;
        }
    }

    /// Returns the extraction rate as a percentage of visited pages
    pub fn success_rate(&self) -> f64 {
        if self.visited == 0 {
            return 0.0;
        }
        (self.extracted as f64 / self.visited as f64) * 100.0
    }

    /// Emits the counters through `tracing`
    pub fn log_summary(&self, label: &str) {
        tracing::info!(
            "{}: {} visited, {} extracted, {} errors, {} links rejected, {} retries",
            label,
            self.visited,
            self.extracted,
            self.errors,
            self.rejected,
            self.retries
        );

        for (kind, count) in &self.errors_by_kind {
            tracing::info!("{}:   {}: {}", label, kind, count);
        }
    }
}

/// Prints run statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages visited: {}", stats.visited);
    println!("  Records extracted: {}", stats.extracted);
    println!("  Errors: {}", stats.errors);
    println!("  Links rejected: {}", stats.rejected);
    println!("  Retries: {}", stats.retries);
    println!();

    if !stats.errors_by_kind.is_empty() {
        println!("Failures by Kind:");
        let mut counts: Vec<_> = stats.errors_by_kind.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

        for (kind, count) in counts {
            let note = if kind.counts_as_error() {
                ""
            } else {
                " (not counted as error)"
            };
            println!("  {}: {}{}", kind, count, note);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages extracted)",
        stats.success_rate(),
        stats.extracted,
        stats.visited
    );
}

/// Breakdown of an existing corpus file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusSummary {
    /// Total records
    pub records: u64,

    /// Records per entry point
    pub by_entry_point: BTreeMap<String, u64>,

    /// Records per BFS depth
    pub by_depth: BTreeMap<u32, u64>,

    /// Total characters of extracted text
    pub text_chars: u64,
}

impl CorpusSummary {
    /// Builds a summary from the records of a corpus file
    pub fn from_records(records: &[PageRecord]) -> Self {
        let mut summary = Self::default();

        for record in records {
            summary.records += 1;
            summary.text_chars += record.text_content.chars().count() as u64;
            *summary
                .by_entry_point
                .entry(record.source_entry_point.clone())
                .or_insert(0) += 1;
            *summary.by_depth.entry(record.depth).or_insert(0) += 1;
        }

        summary
    }
}

/// Prints a corpus file breakdown to stdout
pub fn print_corpus_summary(summary: &CorpusSummary) {
    println!("=== Corpus Statistics ===\n");

    println!("Records: {}", summary.records);
    println!("Text characters: {}", summary.text_chars);
    println!();

    if !summary.by_entry_point.is_empty() {
        println!("Records by Entry Point:");
        for (entry_point, count) in &summary.by_entry_point {
            println!("  {}: {}", entry_point, count);
        }
        println!();
    }

    if !summary.by_depth.is_empty() {
        println!("Records by Depth:");
        for (depth, count) in &summary.by_depth {
            println!("  {}: {}", depth, count);
        }
    }
}
