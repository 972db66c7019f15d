use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Normalizes a URL into the key used by the visited set
///
/// Every membership check and insertion goes through this function, so two
/// spellings of the same page collapse onto one key.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme and a host
/// 3. Lowercase the host (done by the parser) and drop the default port
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters
/// 7. Sort remaining query parameters by key
/// 8. Remove empty query string (trailing ?)
///
/// The scheme and a `www.` prefix are kept: allow-lists name full hosts and some
/// institutional sites serve different content on the bare domain.
///
/// # Examples
///
/// ```
/// use campus_corpus::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.EDU/it/faq/#top").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.edu/it/faq");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Normalizes a URL and returns its string key, or `None` if it cannot be crawled
pub fn normalize_key(url_str: &str) -> Option<String> {
    normalize_url(url_str).ok().map(String::from)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    // Stable sort keeps repeated keys in their original relative order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
