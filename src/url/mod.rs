//! URL handling module for Campus-Corpus
//!
//! This module provides URL normalization, host matching against allow-lists,
//! and the admission filter that decides which discovered links enter the frontier.

mod admission;
mod domain;
mod normalize;

// Re-export main functions
pub use admission::{
    admit, evaluate, non_document_extension, Admission, AdmissionPolicy, Rejection,
};
pub use domain::{extract_domain, is_allowed_host, matches_domain};
pub use normalize::{normalize_key, normalize_url};
