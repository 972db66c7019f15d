//! Configuration module for Campus-Corpus
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use campus_corpus::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! for entry in &config.entry_points {
//!     println!("{} (max depth {})", entry.url, entry.max_depth);
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, EntryPoint, FilterConfig, OutputConfig, Renderer, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
