//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full crawl
//! cycle end-to-end, from configuration to the corpus file on disk.

use campus_corpus::config::{
    load_config, Config, CrawlerConfig, EntryPoint, FilterConfig, OutputConfig, UserAgentConfig,
};
use campus_corpus::crawler::run_crawl;
use campus_corpus::output::{count_records, read_records, OpenMode};
use campus_corpus::ErrorKind;
use std::io::Write;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &str = "Students can reset a forgotten NetID password online at any hour of the day.";

/// Builds an HTML page whose main content passes extraction
fn page(title: &str, links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();
    format!(
        r#"<html><head><title>{}</title></head><body>
        <nav><ul>{}</ul></nav>
        <main><h1>{}</h1><p>{}</p></main>
        </body></html>"#,
        title, anchors, title, BODY
    )
}

async fn mount_page(server: &MockServer, route: &str, markup: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(markup, "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

/// Creates a test configuration crawling the mock server's host
fn create_test_config(entry_points: Vec<EntryPoint>, corpus_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            fetch_timeout_ms: 2_000,
            rate_limit_delay_ms: 0,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.edu/contact".to_string(),
        },
        output: OutputConfig {
            corpus_path: corpus_path.to_string(),
        },
        filter: FilterConfig {
            allowed_domains: vec!["127.0.0.1".to_string()],
            ..FilterConfig::default()
        },
        entry_points,
    }
}

fn entry(url: String, max_depth: u32) -> EntryPoint {
    EntryPoint {
        url,
        max_depth,
        allowed_domains: vec![],
    }
}

fn corpus_path(dir: &TempDir) -> String {
    dir.path().join("corpus.jsonl").display().to_string()
}

#[tokio::test]
async fn test_crawl_writes_admitted_pages_only() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/it",
        page(
            "IT Services",
            &[
                format!("{}/it/faq", base),
                "http://other.test/x".to_string(),
                format!("{}/it?color=red", base),
            ],
        ),
    )
    .await;
    mount_page(&server, "/it/faq", page("FAQ", &[])).await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);
    let config = create_test_config(vec![entry(format!("{}/it", base), 1)], &corpus);

    let stats = run_crawl(config, OpenMode::Truncate).await.unwrap();

    assert_eq!(stats.visited, 2);
    assert_eq!(stats.extracted, 2);
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.rejected, 2);

    let records = read_records(&corpus).unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].url, format!("{}/it", base));
    assert_eq!(records[0].title, "IT Services");
    assert_eq!(records[0].depth, 0);
    assert!(records[0].text_content.contains("NetID"));
    assert!(!records[0].text_content.contains("other.test"));

    assert_eq!(records[1].url, format!("{}/it/faq", base));
    assert_eq!(records[1].depth, 1);
    assert_eq!(records[1].source_entry_point, format!("{}/it", base));
}

#[tokio::test]
async fn test_corpus_lines_use_record_schema() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &[])).await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);
    let config = create_test_config(vec![entry(format!("{}/", server.uri()), 0)], &corpus);

    run_crawl(config, OpenMode::Truncate).await.unwrap();

    let content = std::fs::read_to_string(&corpus).unwrap();
    assert!(content.ends_with('\n'));

    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);

    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    for key in [
        "url",
        "title",
        "textContent",
        "extractedAt",
        "depth",
        "sourceEntryPoint",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }

    let extracted_at = value["extractedAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(extracted_at).is_ok());
}

#[tokio::test]
async fn test_timeout_is_counted_and_crawl_continues() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        page("Home", &[format!("{}/slow", base), format!("{}/fast", base)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(page("Slow", &[]), "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/fast", page("Fast", &[])).await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);
    let mut config = create_test_config(vec![entry(format!("{}/", base), 1)], &corpus);
    config.crawler.fetch_timeout_ms = 300;

    let stats = run_crawl(config, OpenMode::Truncate).await.unwrap();

    assert_eq!(stats.errors_of(ErrorKind::Timeout), 1);
    assert_eq!(stats.extracted, 2);

    let urls: Vec<String> = read_records(&corpus)
        .unwrap()
        .into_iter()
        .map(|r| r.url)
        .collect();
    assert_eq!(urls, vec![format!("{}/", base), format!("{}/fast", base)]);
}

#[tokio::test]
async fn test_depth_limit_stops_expansion() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/a", page("A", &[format!("{}/b", base)])).await;
    mount_page(&server, "/b", page("B", &[format!("{}/c", base)])).await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(page("C", &[]), "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);
    let config = create_test_config(vec![entry(format!("{}/a", base), 1)], &corpus);

    let stats = run_crawl(config, OpenMode::Truncate).await.unwrap();

    assert_eq!(stats.visited, 2);
    assert_eq!(count_records(&corpus).unwrap(), 2);
}

#[tokio::test]
async fn test_shared_links_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        page("Home", &[format!("{}/a", base), format!("{}/b", base)]),
    )
    .await;
    mount_page(
        &server,
        "/a",
        page("A", &[format!("{}/shared", base), format!("{}/b/", base)]),
    )
    .await;
    mount_page(
        &server,
        "/b",
        page("B", &[format!("{}/shared#top", base), format!("{}/", base)]),
    )
    .await;
    mount_page(&server, "/shared", page("Shared", &[])).await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);
    let config = create_test_config(vec![entry(format!("{}/", base), 3)], &corpus);

    let stats = run_crawl(config, OpenMode::Truncate).await.unwrap();
    assert_eq!(stats.visited, 4);
    assert_eq!(stats.extracted, 4);

    let shared = read_records(&corpus)
        .unwrap()
        .into_iter()
        .find(|r| r.url.ends_with("/shared"))
        .unwrap();
    assert_eq!(shared.depth, 2);
}

#[tokio::test]
async fn test_pdf_entry_point_and_broken_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/catalog.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/library",
        page(
            "Library",
            &[format!("{}/missing", base), format!("{}/hours.pdf", base)],
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);
    let config = create_test_config(
        vec![
            entry(format!("{}/catalog.pdf", base), 0),
            entry(format!("{}/library", base), 1),
        ],
        &corpus,
    );

    let stats = run_crawl(config, OpenMode::Truncate).await.unwrap();

    assert_eq!(stats.errors_of(ErrorKind::UnsupportedContentType), 1);
    assert_eq!(stats.errors_of(ErrorKind::HttpError), 1);
    assert_eq!(stats.errors, 1);
    // hours.pdf is refused at depth 1 without being fetched
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.visited, 3);

    let records = read_records(&corpus).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_entry_point, format!("{}/library", base));
}

#[tokio::test]
async fn test_truncate_discards_previous_corpus() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", &[])).await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);
    std::fs::write(&corpus, "{\"stale\":true}\n{\"stale\":true}\n").unwrap();

    let config = create_test_config(vec![entry(format!("{}/", server.uri()), 0)], &corpus);
    run_crawl(config, OpenMode::Truncate).await.unwrap();

    let records = read_records(&corpus).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Home");
}

#[tokio::test]
async fn test_append_repairs_interrupted_corpus() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/first", page("First", &[])).await;
    mount_page(&server, "/second", page("Second", &[])).await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);

    let config = create_test_config(vec![entry(format!("{}/first", base), 0)], &corpus);
    run_crawl(config, OpenMode::Truncate).await.unwrap();

    // Simulate a crash in the middle of writing the next record
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&corpus)
        .unwrap();
    file.write_all(b"{\"url\":\"http://127.0.0.1/half").unwrap();
    drop(file);
    assert!(read_records(&corpus).is_err());

    let config = create_test_config(vec![entry(format!("{}/second", base), 0)], &corpus);
    run_crawl(config, OpenMode::Append).await.unwrap();

    let titles: Vec<String> = read_records(&corpus)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["First", "Second"]);
}

#[tokio::test]
async fn test_unwritable_corpus_is_fatal() {
    let dir = TempDir::new().unwrap();
    // A directory cannot be opened as the corpus file
    let corpus = dir.path().display().to_string();

    let config = create_test_config(
        vec![entry("http://127.0.0.1:9/".to_string(), 0)],
        &corpus,
    );

    let err = run_crawl(config, OpenMode::Truncate).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/it", page("IT", &[format!("{}/it/faq", base)])).await;
    mount_page(&server, "/it/faq", page("FAQ", &[])).await;

    let dir = TempDir::new().unwrap();
    let corpus = corpus_path(&dir);
    let config_path = dir.path().join("crawler.toml");

    let toml = format!(
        r#"
[crawler]
fetch-timeout-ms = 2000
rate-limit-delay-ms = 0

[user-agent]
crawler-name = "KSU-Crawler"
crawler-version = "1.0"
contact-url = "https://campus.kennesaw.edu"

[output]
corpus-path = "{}"

[filter]
allowed-domains = ["127.0.0.1"]

[[entry-point]]
url = "{}/it"
max-depth = 1
"#,
        corpus.replace('\\', "\\\\"),
        base
    );
    std::fs::write(&config_path, toml).unwrap();

    let config = load_config(&config_path).unwrap();
    let stats = run_crawl(config, OpenMode::Truncate).await.unwrap();

    assert_eq!(stats.extracted, 2);
    assert_eq!(count_records(&corpus).unwrap(), 2);
}
