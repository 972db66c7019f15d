//! State module for classifying crawl outcomes
//!
//! # Components
//!
//! - `ErrorKind`: the taxonomy every page failure and fatal condition is counted under

mod error_kind;

// Re-export main types
pub use error_kind::ErrorKind;
