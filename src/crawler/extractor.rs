//! Main-content extraction
//!
//! Turns fetched markup into the title and body text of a corpus record. Extraction
//! is a pure function of the markup: no network access and no randomness, so the
//! same page always yields the same record text.

use scraper::{ElementRef, Html, Selector};

/// Candidate main-content containers, most specific first
const CONTAINER_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    "#content",
    ".content",
    "body",
];

/// Elements whose text never belongs to the main content
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe",
    "svg", "template", "button", "select",
];

/// ARIA roles of page chrome
const SKIPPED_ROLES: &[&str] = &["navigation", "banner", "contentinfo", "search", "menu"];

/// Words in a class or id that mark navigation, menus and consent banners
const BOILERPLATE_WORDS: &[&str] = &[
    "nav",
    "navbar",
    "navigation",
    "menu",
    "breadcrumb",
    "breadcrumbs",
    "cookie",
    "cookies",
    "consent",
    "skip",
];

/// Elements that start a new line of text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section",
    "table", "td", "th", "tr", "ul",
];

/// Title and text of a page's main content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Page title, if the markup names one
    pub title: Option<String>,

    /// Main-content text, one block per line
    pub text: String,
}

/// Result of running an extractor over markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Extracted(ExtractedContent),

    /// No usable main content; the reason is for logs only
    Failed(String),
}

/// Extracts the main textual content of a page
///
/// Implementations must be deterministic and must report empty or too-short output as
/// [`ExtractOutcome::Failed`] rather than as extracted empty text.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, markup: &str) -> ExtractOutcome;
}

/// Boilerplate-stripping extractor
///
/// Picks the first content container that yields enough text (`main`, `article`,
/// `[role=main]`, `#content`, `.content`, then `body`), drops page chrome inside it and
/// emits one line per block element with whitespace collapsed.
#[derive(Debug, Clone)]
pub struct MainContentExtractor {
    min_text_length: usize,
}

impl MainContentExtractor {
    /// Creates an extractor that rejects text shorter than `min_text_length` characters
    pub fn new(min_text_length: usize) -> Self {
        Self { min_text_length }
    }

    fn main_text(&self, document: &Html) -> Option<String> {
        let mut best: Option<String> = None;

        for selector in CONTAINER_SELECTORS {
            let selector = match Selector::parse(selector) {
                Ok(selector) => selector,
                Err(_) => continue,
            };

            let container = match document.select(&selector).next() {
                Some(container) => container,
                None => continue,
            };

            let text = container_text(container);
            if text.chars().count() >= self.min_text_length {
                return Some(text);
            }

            if best.as_ref().map_or(true, |b| text.len() > b.len()) {
                best = Some(text);
            }
        }

        best
    }
}

impl Default for MainContentExtractor {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ContentExtractor for MainContentExtractor {
    fn extract(&self, markup: &str) -> ExtractOutcome {
        let document = Html::parse_document(markup);

        let text = match self.main_text(&document) {
            Some(text) if !text.is_empty() => text,
            _ => return ExtractOutcome::Failed("no text content".to_string()),
        };

        let length = text.chars().count();
        if length < self.min_text_length {
            return ExtractOutcome::Failed(format!(
                "main content too short ({} < {} characters)",
                length, self.min_text_length
            ));
        }

        ExtractOutcome::Extracted(ExtractedContent {
            title: extract_title(&document),
            text,
        })
    }
}

/// Finds the page title: `<title>`, then `og:title`, then the first `<h1>`
fn extract_title(document: &Html) -> Option<String> {
    let from_element = |selector: &str| -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|s| !s.is_empty())
    };

    let from_meta = |selector: &str| -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("content"))
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
    };

    from_element("title")
        .or_else(|| from_meta("meta[property='og:title']"))
        .or_else(|| from_element("h1"))
}

/// Collects the text under a container, one line per block
fn container_text(container: ElementRef<'_>) -> String {
    let mut raw = String::new();
    walk(container, &mut raw);

    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pending work of the text walk
enum Step<'a> {
    Open(ElementRef<'a>),
    Text(&'a str),
    Close,
}

/// Depth-first text walk over an explicit stack
fn walk(root: ElementRef<'_>, out: &mut String) {
    let mut stack = vec![Step::Open(root)];

    while let Some(step) = stack.pop() {
        let element = match step {
            Step::Open(element) => element,
            Step::Text(text) => {
                out.push_str(text);
                continue;
            }
            Step::Close => {
                out.push('\n');
                continue;
            }
        };

        if is_boilerplate(element) {
            continue;
        }

        if BLOCK_TAGS.contains(&element.value().name()) {
            out.push('\n');
            stack.push(Step::Close);
        }

        for child in element.children().rev() {
            if let Some(text) = child.value().as_text() {
                stack.push(Step::Text(text));
            } else if let Some(child) = ElementRef::wrap(child) {
                stack.push(Step::Open(child));
            }
        }
    }
}

/// Returns true if the element is page chrome rather than content
fn is_boilerplate(element: ElementRef<'_>) -> bool {
    let value = element.value();

    if SKIPPED_TAGS.contains(&value.name()) {
        return true;
    }

    if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
        return true;
    }

    if let Some(role) = value.attr("role") {
        if SKIPPED_ROLES.contains(&role.trim().to_ascii_lowercase().as_str()) {
            return true;
        }
    }

    let id = value.attr("id").unwrap_or("");
    value.classes().chain(std::iter::once(id)).any(has_boilerplate_word)
}

/// Checks the hyphen/underscore separated words of a class or id
fn has_boilerplate_word(token: &str) -> bool {
    token
        .split(|c: char| c == '-' || c == '_')
        .any(|word| BOILERPLATE_WORDS.contains(&word.to_ascii_lowercase().as_str()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
