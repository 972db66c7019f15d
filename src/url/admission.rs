//! URL admission filter
//!
//! Decides whether a discovered URL may enter the frontier. The filter is a pure
//! function of the URL, the policy and the BFS depth: no I/O, and malformed input is
//! rejected rather than reported as an error.

use crate::config::{Config, EntryPoint};
use crate::url::domain::{extract_domain, is_allowed_host};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Extensions of resources that never yield corpus text when fetched as a page
const NON_DOCUMENT_EXTENSIONS: &[&str] = &[
    // Documents handled outside the HTML pipeline
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "csv",
    // Images
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico", "tif", "tiff",
    // Audio and video
    "mp3", "mp4", "m4a", "wav", "avi", "mov", "wmv", "webm", "ogg",
    // Archives and installers
    "zip", "gz", "tgz", "tar", "rar", "7z", "exe", "msi", "dmg", "iso", "apk",
    // Page assets
    "css", "js", "json", "xml", "rss", "woff", "woff2", "ttf", "eot",
];

/// Why a URL was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Not parseable as an absolute URL
    Malformed,
    /// Scheme other than http/https
    Scheme(String),
    /// Host missing or not on the allow-list
    Domain(String),
    /// Path under an excluded segment such as `/cart`
    ExcludedPath(String),
    /// Query carries a disallowed key
    QueryKey(String),
    /// Resource type that is not a document at this depth
    Extension(String),
}

/// Verdict of the admission filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected(Rejection),
}

impl Admission {
    /// Returns true if the URL may be enqueued
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

impl fmt::Display for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admitted => write!(f, "admitted"),
            Self::Rejected(Rejection::Malformed) => write!(f, "malformed URL"),
            Self::Rejected(Rejection::Scheme(s)) => write!(f, "unsupported scheme '{}'", s),
            Self::Rejected(Rejection::Domain(d)) => write!(f, "domain '{}' not allowed", d),
            Self::Rejected(Rejection::ExcludedPath(p)) => write!(f, "excluded path '{}'", p),
            Self::Rejected(Rejection::QueryKey(k)) => write!(f, "disallowed query key '{}'", k),
            Self::Rejected(Rejection::Extension(e)) => write!(f, "non-document extension '.{}'", e),
        }
    }
}

/// The admission rules in effect for one entry point
#[derive(Debug, Clone, Default)]
pub struct AdmissionPolicy {
    allowed_domains: Vec<String>,
    disallowed_query_keys: HashSet<String>,
    pagination_keys: HashSet<String>,
    excluded_path_segments: Vec<String>,
    root_document_extensions: HashSet<String>,
}

impl AdmissionPolicy {
    /// Creates a policy from an allow-list and a set of disallowed query keys
    ///
    /// Every other rule starts empty; see the `with_*` builders.
    pub fn new<D, K>(allowed_domains: D, disallowed_query_keys: K) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        Self {
            allowed_domains: lowercase(allowed_domains).collect(),
            disallowed_query_keys: lowercase(disallowed_query_keys).collect(),
            ..Self::default()
        }
    }

    /// Disallowed keys that are still admitted when they are the only query parameter
    pub fn with_pagination_keys<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.pagination_keys = lowercase(keys).collect();
        self
    }

    /// Path prefixes whose pages are never admitted
    pub fn with_excluded_path_segments<I>(mut self, segments: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.excluded_path_segments = lowercase(segments).collect();
        self
    }

    /// Non-document extensions admitted at depth 0
    pub fn with_root_document_extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.root_document_extensions = lowercase(extensions)
            .map(|e| e.trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// Builds the policy an entry point is crawled under
    pub fn for_entry_point(config: &Config, entry: &EntryPoint) -> Self {
        let filter = &config.filter;

        Self::new(config.allowed_domains_for(entry), &filter.disallowed_query_keys)
            .with_pagination_keys(&filter.pagination_keys)
            .with_excluded_path_segments(&filter.excluded_path_segments)
            .with_root_document_extensions(&filter.root_document_extensions)
    }

    /// The allow-listed domains, lowercased
    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }
}

fn lowercase<I>(items: I) -> impl Iterator<Item = String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_lowercase())
        .filter(|item| !item.is_empty())
}

/// Runs every admission rule and reports the first one that fails
///
/// Rules are checked in order: parse, scheme, domain, excluded path, query keys,
/// extension.
pub fn evaluate(url: &str, policy: &AdmissionPolicy, depth: u32) -> Admission {
    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(_) => return Admission::Rejected(Rejection::Malformed),
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Admission::Rejected(Rejection::Scheme(parsed.scheme().to_string()));
    }

    let host = match extract_domain(&parsed) {
        Some(host) => host,
        None => return Admission::Rejected(Rejection::Domain(String::new())),
    };
    if !is_allowed_host(&host, &policy.allowed_domains) {
        return Admission::Rejected(Rejection::Domain(host));
    }

    let path = parsed.path().to_lowercase();
    if let Some(segment) = policy
        .excluded_path_segments
        .iter()
        .find(|segment| contains_segment(&path, segment))
    {
        return Admission::Rejected(Rejection::ExcludedPath(segment.clone()));
    }

    if let Some(key) = disallowed_query_key(&parsed, policy) {
        return Admission::Rejected(Rejection::QueryKey(key));
    }

    if let Some(extension) = non_document_extension(&parsed) {
        let allowed_at_root = depth == 0 && policy.root_document_extensions.contains(&extension);
        if !allowed_at_root {
            return Admission::Rejected(Rejection::Extension(extension));
        }
    }

    Admission::Admitted
}

/// Returns true if the URL may enter the frontier at the given depth
///
/// # Examples
///
/// ```
/// use campus_corpus::url::{admit, AdmissionPolicy};
///
/// let policy = AdmissionPolicy::new(["example.edu"], ["color"]);
///
/// assert!(admit("https://example.edu/it/faq", &policy, 1));
/// assert!(!admit("https://other.edu/x", &policy, 1));
/// assert!(!admit("https://example.edu/it?color=red", &policy, 1));
/// assert!(!admit("::not a url::", &policy, 1));
/// ```
pub fn admit(url: &str, policy: &AdmissionPolicy, depth: u32) -> bool {
    evaluate(url, policy, depth).is_admitted()
}

/// Returns the extension of a URL that points at a binary or asset rather than a page
pub fn non_document_extension(url: &Url) -> Option<String> {
    file_extension(&url.path().to_lowercase())
        .filter(|extension| NON_DOCUMENT_EXTENSIONS.contains(&extension.as_str()))
}

/// Finds a disallowed key in the query, honouring the lone-pagination exception
fn disallowed_query_key(url: &Url, policy: &AdmissionPolicy) -> Option<String> {
    let keys: Vec<String> = url
        .query_pairs()
        .map(|(key, _)| key.to_lowercase())
        .collect();

    let lone_pagination = keys.len() == 1 && policy.pagination_keys.contains(&keys[0]);
    if lone_pagination {
        return None;
    }

    keys.into_iter()
        .find(|key| policy.disallowed_query_keys.contains(key))
}

/// Matches `segment` against the path only at segment boundaries
///
/// `/account` excludes `/account`, `/account/settings` and `/account.php` but not
/// `/accounting-services`.
fn contains_segment(path: &str, segment: &str) -> bool {
    let segment = segment.trim_end_matches('/');
    if segment.is_empty() {
        return false;
    }

    path.match_indices(segment).any(|(idx, _)| {
        let rest = &path[idx + segment.len()..];
        rest.is_empty() || rest.starts_with('/') || rest.starts_with('.')
    })
}

/// Returns the lowercase extension of the last path segment, if any
fn file_extension(path: &str) -> Option<String> {
    let last = path.rsplit('/').next()?;
    let (stem, extension) = last.rsplit_once('.')?;

    if stem.is_empty() || extension.is_empty() {
        return None;
    }

    Some(extension.to_lowercase())
}
