//! Host extraction and allow-list matching

use url::Url;

/// Extracts the lowercase host from a URL
///
/// Returns `None` for URLs without a host (`mailto:`, `data:` and similar).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use campus_corpus::url::extract_domain;
///
/// let url = Url::parse("https://Campus.Kennesaw.EDU/offices-services/uits/").unwrap();
/// assert_eq!(extract_domain(&url), Some("campus.kennesaw.edu".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a host falls under an allow-listed domain
///
/// Matching is by registrable suffix: `example.edu` admits `example.edu` itself and
/// any subdomain such as `it.example.edu`, but not `myexample.edu`. A leading `*.` on
/// the pattern is accepted and means the same thing. Both sides are expected to be
/// lowercase.
///
/// # Examples
///
/// ```
/// use campus_corpus::url::matches_domain;
///
/// assert!(matches_domain("kennesaw.edu", "campus.kennesaw.edu"));
/// assert!(matches_domain("*.kennesaw.edu", "kennesaw.edu"));
/// assert!(!matches_domain("campus.kennesaw.edu", "kennesaw.edu"));
/// assert!(!matches_domain("kennesaw.edu", "notkennesaw.edu"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);

    if base.is_empty() || host.is_empty() {
        return false;
    }

    host == base
        || (host.len() > base.len()
            && host.ends_with(base)
            && host.as_bytes()[host.len() - base.len() - 1] == b'.')
}

/// Checks a host against every pattern of an allow-list
pub fn is_allowed_host(host: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|pattern| matches_domain(pattern, host))
}
