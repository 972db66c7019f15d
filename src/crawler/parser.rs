//! Link discovery in fetched markup
//!
//! Lists the outbound links of a page as absolute URLs. Whether a link is worth
//! crawling is decided later by the admission filter; this module only resolves and
//! discards what can never be a page address.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts all followable links from a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
///
/// Relative links are resolved against `base_url`, which should be the final URL of
/// the fetch so that redirects resolve correctly. The result keeps document order and
/// contains no duplicates.
///
/// # Example
///
/// ```
/// use campus_corpus::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/it/faq">FAQ</a><a href="mailto:it@example.edu">Mail</a></body></html>"#;
/// let base_url = Url::parse("https://example.edu/it").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links, vec!["https://example.edu/it/faq".to_string()]);
/// ```
pub fn extract_links(markup: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(markup);
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |href: &str| {
        if let Some(absolute_url) = resolve_link(href, base_url) {
            if seen.insert(absolute_url.clone()) {
                links.push(absolute_url);
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.edu/it/page").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        extract_links(html, &base_url())
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.edu/x">Link</a></body></html>"#;
        assert_eq!(links(html), vec!["https://other.edu/x"]);
    }

    #[test]
    fn test_extract_root_relative_link() {
        let html = r#"<html><body><a href="/other">Link</a></body></html>"#;
        assert_eq!(links(html), vec!["https://example.edu/other"]);
    }

    #[test]
    fn test_extract_relative_path_link() {
        let html = r#"<html><body><a href="faq">Link</a></body></html>"#;
        assert_eq!(links(html), vec!["https://example.edu/it/faq"]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r#"
            <html><body>
                <a href="javascript:void(0)">JS</a>
                <a href="JavaScript:alert(1)">JS</a>
                <a href="mailto:helpdesk@example.edu">Mail</a>
                <a href="tel:+14705786999">Call</a>
                <a href="data:text/html,<h1>Test</h1>">Data</a>
                <a href="ftp://example.edu/file">FTP</a>
            </body></html>
        "#;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<html><body><a href="#section">Jump</a><a href="">Empty</a></body></html>"##;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_fragment_stripped_from_links() {
        let html = r##"<html><body><a href="/faq#top">FAQ</a></body></html>"##;
        assert_eq!(links(html), vec!["https://example.edu/faq"]);
    }

    #[test]
    fn test_follow_nofollow_links() {
        let html = r#"<html><body><a href="/page" rel="nofollow">Link</a></body></html>"#;
        assert_eq!(links(html), vec!["https://example.edu/page"]);
    }

    #[test]
    fn test_extract_canonical_link() {
        let html = r#"<html><head><link rel="canonical" href="https://example.edu/canonical" /></head><body></body></html>"#;
        assert!(links(html).contains(&"https://example.edu/canonical".to_string()));
    }

    #[test]
    fn test_duplicates_removed_in_document_order() {
        let html = r#"
            <html><body>
                <a href="/b">B</a>
                <a href="/a">A</a>
                <a href="/b">B again</a>
                <a href="https://example.edu/a">A absolute</a>
            </body></html>
        "#;
        assert_eq!(
            links(html),
            vec!["https://example.edu/b", "https://example.edu/a"]
        );
    }

    #[test]
    fn test_query_preserved() {
        let html = r#"<html><body><a href="/it?color=red">Red</a></body></html>"#;
        assert_eq!(links(html), vec!["https://example.edu/it?color=red"]);
    }
}
