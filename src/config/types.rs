use serde::Deserialize;

/// Main configuration structure for Campus-Corpus
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(rename = "entry-point", default)]
    pub entry_points: Vec<EntryPoint>,
}

impl Config {
    /// Returns the domains an entry point may crawl
    ///
    /// An entry point's own list overrides the global `[filter]` list.
    pub fn allowed_domains_for<'a>(&'a self, entry: &'a EntryPoint) -> &'a [String] {
        if entry.allowed_domains.is_empty() {
            &self.filter.allowed_domains
        } else {
            &entry.allowed_domains
        }
    }
}

/// How pages are retrieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    /// Plain HTTP GET; the markup is the server response
    #[default]
    Http,
    /// Headless browser; the markup is the DOM after client-side scripts ran
    Browser,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Hard timeout for a single page fetch (milliseconds)
    pub fetch_timeout_ms: u64,

    /// Delay before every fetch (milliseconds)
    pub rate_limit_delay_ms: u64,

    /// Fetches in flight at once within one BFS level; 1 keeps the crawl sequential
    pub max_concurrent_fetches: u32,

    /// Extra attempts for timeouts and network errors
    pub max_retries: u32,

    /// Base delay before the first retry, doubled for every further attempt (milliseconds)
    pub retry_backoff_ms: u64,

    /// Extracted text shorter than this (in characters) counts as an extraction failure
    pub min_text_length: usize,

    /// Page retrieval backend
    pub renderer: Renderer,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 60_000,
            rate_limit_delay_ms: 1_000,
            max_concurrent_fetches: 1,
            max_retries: 0,
            retry_backoff_ms: 2_000,
            min_text_length: 50,
            renderer: Renderer::Http,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Mozilla/5.0 (compatible; Name/Version; +ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; {}/{}; +{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the JSON Lines corpus file
    pub corpus_path: String,
}

/// URL admission rules shared by all entry points
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FilterConfig {
    /// Domains crawled when an entry point has no list of its own
    pub allowed_domains: Vec<String>,

    /// Query parameter keys that mark faceted or filter pages
    pub disallowed_query_keys: Vec<String>,

    /// Disallowed keys that are still admitted when they are the only query parameter
    pub pagination_keys: Vec<String>,

    /// Path prefixes of pages that never carry corpus content (carts, logins, reviews)
    pub excluded_path_segments: Vec<String>,

    /// Non-HTML extensions admitted for entry points themselves (depth 0)
    pub root_document_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };

        Self {
            allowed_domains: Vec::new(),
            disallowed_query_keys: strings(&[
                "color", "size", "display", "filter", "sort", "page",
            ]),
            pagination_keys: strings(&["page"]),
            excluded_path_segments: strings(&[
                "/newreview",
                "/review",
                "/comment",
                "/cart",
                "/checkout",
                "/account",
                "/login",
                "/register",
            ]),
            root_document_extensions: strings(&["pdf"]),
        }
    }
}

/// A seed URL and the depth budget of its breadth-first crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntryPoint {
    /// Seed URL
    pub url: String,

    /// Deepest BFS level that is still fetched (0 = the entry page only)
    pub max_depth: u32,

    /// Domain override for this entry point
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}
