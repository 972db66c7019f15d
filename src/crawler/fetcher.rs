//! Page fetchers
//!
//! This module handles page retrieval for the crawler, including:
//! - Building HTTP clients with a contact-bearing user agent
//! - GET requests under a hard per-page timeout
//! - Content-Type checks that separate pages from binary downloads
//! - Classifying every failure into a typed outcome
//! - Script-rendered retrieval through headless Chromium (`browser` feature)
//!
//! Fetchers never retry; retry policy belongs to the coordinator.

use crate::config::UserAgentConfig;
use crate::state::ErrorKind;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;

/// Maximum redirect hops followed before the fetch counts as a network error
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was retrieved
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Page markup (the rendered DOM for the browser fetcher)
        markup: String,
    },

    /// The fetch did not finish within the timeout
    Timeout,

    /// The server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status: u16,
    },

    /// Connection, DNS, TLS, redirect or body-read failure
    NetworkError {
        /// Error description
        message: String,
    },

    /// The response is not an HTML document
    UnsupportedContentType {
        /// The Content-Type received (or the extension, when detected from the URL)
        content_type: String,
    },
}

impl FetchOutcome {
    /// Returns the error kind for a failed fetch, or `None` on success
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Timeout => Some(ErrorKind::Timeout),
            Self::HttpError { .. } => Some(ErrorKind::HttpError),
            Self::NetworkError { .. } => Some(ErrorKind::NetworkError),
            Self::UnsupportedContentType { .. } => Some(ErrorKind::UnsupportedContentType),
        }
    }

    /// Returns true if this outcome carries markup
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Retrieves pages for the crawler
///
/// Implementations must enforce `timeout` over the whole retrieval and report every
/// failure as a [`FetchOutcome`] rather than an error.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one URL
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use campus_corpus::config::UserAgentConfig;
/// use campus_corpus::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "KSU-Crawler".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://campus.kennesaw.edu".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP fetcher
///
/// Returns the server response as-is; pages that only render their content through
/// client-side scripts need the browser fetcher instead.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from the user agent configuration
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_page(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(&e),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::HttpError {
                status: status.as_u16(),
            };
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return FetchOutcome::UnsupportedContentType { content_type };
        }

        let final_url = response.url().to_string();

        match response.text().await {
            Ok(markup) => FetchOutcome::Success { final_url, markup },
            Err(e) => classify_request_error(&e),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        match tokio::time::timeout(timeout, self.fetch_page(url)).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::Timeout,
        }
    }
}

/// Maps a reqwest error onto a fetch outcome
fn classify_request_error(error: &reqwest::Error) -> FetchOutcome {
    if error.is_timeout() {
        FetchOutcome::Timeout
    } else if error.is_redirect() {
        FetchOutcome::NetworkError {
            message: format!("Redirect error: {}", error),
        }
    } else if error.is_connect() {
        FetchOutcome::NetworkError {
            message: format!("Connection failed: {}", error),
        }
    } else {
        FetchOutcome::NetworkError {
            message: error.to_string(),
        }
    }
}

/// Returns true if a Content-Type header names an HTML document
///
/// A missing header is treated as HTML.
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

#[cfg(feature = "browser")]
mod browser {
    use super::{FetchOutcome, PageFetcher};
    use crate::config::UserAgentConfig;
    use crate::url::non_document_extension;
    use crate::CorpusError;
    use async_trait::async_trait;
    use chromiumoxide::{Browser, BrowserConfig, Page};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::task::JoinHandle;
    use tokio::time::{timeout_at, Instant};
    use url::Url;

    /// Script-rendering fetcher backed by headless Chromium
    ///
    /// The markup returned is the DOM after navigation completed, so content injected by
    /// client-side scripts is included. HTTP status codes are not visible through the
    /// DevTools page API; navigation failures surface as network errors.
    pub struct BrowserFetcher {
        browser: Browser,
        handler: JoinHandle<()>,
    }

    impl BrowserFetcher {
        /// Launches a headless browser identified by the configured user agent
        pub async fn launch(user_agent: &UserAgentConfig) -> Result<Self, CorpusError> {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .arg(format!("--user-agent={}", user_agent.header_value()))
                .build()
                .map_err(CorpusError::Browser)?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| CorpusError::Browser(e.to_string()))?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            tracing::info!("Headless browser launched");

            Ok(Self { browser, handler })
        }

        /// Navigates an open tab and reads back the rendered DOM
        async fn load(page: &Page, url: &str) -> Result<(String, String), String> {
            page.goto(url).await.map_err(|e| e.to_string())?;
            page.wait_for_navigation().await.map_err(|e| e.to_string())?;

            let final_url = page
                .url()
                .await
                .map_err(|e| e.to_string())?
                .unwrap_or_else(|| url.to_string());
            let markup = page.content().await.map_err(|e| e.to_string())?;

            Ok((final_url, markup))
        }

        /// Number of tabs currently open in the browser
        pub async fn open_pages(&self) -> Result<usize, CorpusError> {
            self.browser
                .pages()
                .await
                .map(|pages| pages.len())
                .map_err(|e| CorpusError::Browser(e.to_string()))
        }
    }

    impl Drop for BrowserFetcher {
        // The browser process is killed when `Browser` drops; the event loop is ours
        fn drop(&mut self) {
            self.handler.abort();
        }
    }

    #[async_trait]
    impl PageFetcher for BrowserFetcher {
        async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
            // Navigating to a binary triggers a download instead of a page load
            let extension = Url::parse(url)
                .ok()
                .and_then(|parsed| non_document_extension(&parsed));
            if let Some(extension) = extension {
                return FetchOutcome::UnsupportedContentType {
                    content_type: format!(".{}", extension),
                };
            }

            let deadline = Instant::now() + timeout;

            let page = match timeout_at(deadline, self.browser.new_page("about:blank")).await {
                Ok(Ok(page)) => page,
                Ok(Err(e)) => {
                    return FetchOutcome::NetworkError {
                        message: e.to_string(),
                    }
                }
                Err(_) => return FetchOutcome::Timeout,
            };

            let loaded = timeout_at(deadline, Self::load(&page, url)).await;

            // The tab is closed on every path, including timeouts
            if let Err(e) = page.close().await {
                tracing::debug!("Failed to close page {}: {}", url, e);
            }

            match loaded {
                Ok(Ok((final_url, markup))) => FetchOutcome::Success { final_url, markup },
                Ok(Err(message)) => FetchOutcome::NetworkError { message },
                Err(_) => FetchOutcome::Timeout,
            }
        }
    }

}
