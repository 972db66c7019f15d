//! Campus-Corpus: a bounded breadth-first crawler for institutional websites
//!
//! This crate walks a fixed list of entry points one at a time, admits only URLs on
//! allow-listed domains, extracts the main textual content of every fetched page and
//! streams one JSON record per page into an append-only corpus file.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

pub use state::ErrorKind;

/// Main error type for Campus-Corpus operations
///
/// Only configuration and persistence problems surface as errors. Page-level failures
/// are recorded in [`output::CrawlStats`] and never propagate out of the crawl loop.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write corpus record to {path}: {source}")]
    Persistence {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize corpus record for {url}: {source}")]
    Serialize {
        url: String,
        source: serde_json::Error,
    },

    #[error("Corrupt corpus record at {path}:{line}: {source}")]
    CorruptRecord {
        path: String,
        line: usize,
        source: serde_json::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),
}

impl CorpusError {
    /// Maps the error onto the crawl error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Persistence { .. } | Self::Serialize { .. } | Self::CorruptRecord { .. } => {
                ErrorKind::PersistenceFailure
            }
            Self::Config(_) | Self::Client(_) | Self::Browser(_) | Self::UrlError(_) => {
                ErrorKind::ConfigurationError
            }
        }
    }

    /// Returns true if the error must abort the whole crawl
    ///
    /// Every error that reaches this type is fatal; recoverable page failures are
    /// counted rather than raised.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Campus-Corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use output::{CrawlStats, PageRecord};
pub use url::{admit, normalize_url, AdmissionPolicy};
