//! Error taxonomy for crawl outcomes
//!
//! Every failure the crawler observes is classified into exactly one of these kinds.

use serde::Serialize;
use std::fmt;

/// Classifies why a page (or the whole crawl) did not produce a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // ===== Recoverable Page Failures =====
    /// The fetch did not complete within the per-page timeout
    Timeout,

    /// The server answered with a non-success status code
    HttpError,

    /// Connection, DNS, TLS or body-read failure
    NetworkError,

    /// The response is not an HTML document (PDF, image, download)
    UnsupportedContentType,

    /// The page was fetched but yielded no usable main content
    ExtractionFailed,

    // ===== Fatal Conditions =====
    /// The corpus sink could not be written
    PersistenceFailure,

    /// The configuration is missing, unreadable or invalid
    ConfigurationError,
}

impl ErrorKind {
    /// Returns true if this kind aborts the crawl
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PersistenceFailure | Self::ConfigurationError)
    }

    /// Returns true if a page failing with this kind is abandoned and the BFS continues
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Returns true if this kind counts towards the `errors` total
    ///
    /// Binary documents are recorded per kind but are a legitimate outcome rather than
    /// a failure, so they stay out of the total.
    pub fn counts_as_error(&self) -> bool {
        !matches!(self, Self::UnsupportedContentType)
    }

    /// Returns true if a fetch failing with this kind may be attempted again
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::NetworkError)
    }

    /// Stable lowercase label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::HttpError => "http_error",
            Self::NetworkError => "network_error",
            Self::UnsupportedContentType => "unsupported_content_type",
            Self::ExtractionFailed => "extraction_failed",
            Self::PersistenceFailure => "persistence_failure",
            Self::ConfigurationError => "configuration_error",
        }
    }

    /// Returns all error kinds in reporting order
    pub fn all() -> [Self; 7] {
        [
            Self::Timeout,
            Self::HttpError,
            Self::NetworkError,
            Self::UnsupportedContentType,
            Self::ExtractionFailed,
            Self::PersistenceFailure,
            Self::ConfigurationError,
        ]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
