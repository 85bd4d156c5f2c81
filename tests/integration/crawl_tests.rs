use crate::common::{html_page, html_page_with_status, records, test_config};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sumi_scribe::crawler::{Coordinator, StepOutcome, StopReason};
use sumi_scribe::extract::Extractor;
use sumi_scribe::state::OutcomeStatus;
use sumi_scribe::storage::{document_path, STATS_FILE};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_step_enqueues_only_crawlable_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/a">A</a>
               <a href="https://other.com/b">B</a>
               <a href="/img.png">Image</a>"#,
        ),
    )
    .await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    coordinator.seed().await;
    assert_eq!(coordinator.step().await.unwrap(), StepOutcome::Continue);

    let queued: Vec<&str> = coordinator.frontier().iter().collect();
    assert_eq!(queued, vec![format!("{}/a", base).as_str()]);

    let records = records(dir.path());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, OutcomeStatus::Ok);
    assert_eq!(records[0].url, format!("{}/", base));
    assert_eq!(records[0].http_status, Some(200));
}

#[tokio::test]
async fn test_full_crawl_writes_pages_and_stats() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        html_page("Home", r#"<a href="/a">A</a> <a href="/b?utm_source=x">B</a>"#),
    )
    .await;
    // Links back to pages already queued or visited must not be refetched
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", r#"<a href="/">Home</a> <a href="/b">B</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page_with_status(404, "Missing", "<p>gone</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.stop_reason, StopReason::QueueExhausted);
    assert_eq!(stats.pages_written, 3);
    assert_eq!(stats.queue_remaining, 0);
    assert_eq!(stats.base_host, "127.0.0.1");

    let records = records(dir.path());
    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    let expected = [format!("{}/", base), format!("{}/a", base), format!("{}/b", base)];
    assert_eq!(urls, expected.iter().map(String::as_str).collect::<Vec<_>>());

    // Non-2xx HTML is still stored
    assert_eq!(records[2].status, OutcomeStatus::Ok);
    assert_eq!(records[2].http_status, Some(404));

    let mut running = 0;
    for record in &records {
        let relative = record.markdown_path.as_deref().unwrap();
        assert_eq!(relative, document_path(&record.url));
        let document = std::fs::read_to_string(dir.path().join(relative)).unwrap();
        assert!(document.starts_with(&format!("---\nsource: {}\n", record.url)));
        assert_eq!(record.markdown_bytes, Some(document.len() as u64));

        running += document.len() as u64;
        assert_eq!(record.total_bytes, Some(running));
    }
    assert_eq!(stats.total_markdown_bytes, running);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(STATS_FILE)).unwrap())
            .unwrap();
    assert_eq!(written["pages_written"], 3);
    assert_eq!(written["stop_reason"], "queue_exhausted");
}

#[tokio::test]
async fn test_robots_disallow_is_recorded_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        html_page("Home", r#"<a href="/private/x">P</a> <a href="/public">Pub</a>"#),
    )
    .await;
    mount_page(&server, "/public", html_page("Public", "<p>hi</p>")).await;
    Mock::given(method("GET"))
        .and(path("/private/x"))
        .respond_with(html_page("Private", ""))
        .expect(0)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    let records = records(dir.path());
    let blocked: Vec<&str> = records
        .iter()
        .filter(|r| r.status == OutcomeStatus::BlockedByRobots)
        .map(|r| r.url.as_str())
        .collect();
    assert_eq!(blocked, vec![format!("{}/private/x", base).as_str()]);
    assert!(coordinator.visited().contains(&format!("{}/private/x", base)));
    assert_eq!(stats.outcomes.blocked_by_robots, 1);
    assert_eq!(stats.pages_written, 2);
}

#[tokio::test]
async fn test_unreachable_robots_fails_open() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", "<p>open</p>")).await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.pages_written, 1);
    assert_eq!(stats.outcomes.blocked_by_robots, 0);
}

#[tokio::test]
async fn test_redirect_off_domain() {
    let server = MockServer::start().await;
    let base = server.uri();
    let port = url::Url::parse(&base).unwrap().port().unwrap();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", html_page("Home", r#"<a href="/out">Out</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/out"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("http://localhost:{}/landing", port).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/landing", html_page("Landing", "<p>elsewhere</p>")).await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    let records = records(dir.path());
    let redirect = records
        .iter()
        .find(|r| r.status == OutcomeStatus::RedirectedOffDomain)
        .expect("redirect record");
    assert_eq!(redirect.url, format!("{}/out", base));
    assert_eq!(
        redirect.redirect.as_deref(),
        Some(format!("http://localhost:{}/landing", port).as_str())
    );
    assert_eq!(redirect.http_status, Some(200));
    assert!(redirect.markdown_path.is_none());

    assert_eq!(stats.pages_written, 1);
    assert_eq!(stats.outcomes.redirected_off_domain, 1);
    assert!(coordinator.visited().contains(&format!("{}/out", base)));
}

#[tokio::test]
async fn test_same_scope_redirect_is_transparent() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", html_page("Home", r#"<a href="/old">Old</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new", base).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/new", html_page("New", r#"<a href="/old">Old again</a>"#)).await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    let records = records(dir.path());
    assert_eq!(stats.pages_written, 2);
    assert_eq!(records[1].url, format!("{}/new", base));
    assert_eq!(records[1].status, OutcomeStatus::Ok);
    assert_eq!(records[1].requested_url, Some(format!("{}/old", base)));
    assert!(coordinator.visited().contains(&format!("{}/old", base)));
    assert!(coordinator.visited().contains(&format!("{}/new", base)));
}

#[tokio::test]
async fn test_redirect_onto_visited_page_is_recorded_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", html_page("Home", r#"<a href="/index.html">Index</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/", base).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    let records = records(dir.path());
    assert_eq!(stats.pages_written, 1);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status, OutcomeStatus::RedirectedToVisited);
    assert_eq!(records[1].url, format!("{}/index.html", base));
    assert_eq!(records[1].redirect, Some(format!("{}/", base)));
    assert_eq!(records[1].markdown_path, None);
    assert_eq!(stats.outcomes.redirected_to_visited, 1);
    assert!(coordinator.visited().contains(&format!("{}/index.html", base)));
}

/// Records the URLs it is called with and returns a fixed document
struct RecordingExtractor {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Extractor for RecordingExtractor {
    fn extract(&self, _html: &str, url: &str, _fetched_at: &str) -> String {
        self.seen.lock().unwrap().push(url.to_string());
        format!("stub {}", url)
    }
}

#[tokio::test]
async fn test_custom_extractor_gets_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new", base).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/new", html_page("New", "<p>body</p>")).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut config = test_config(&base, dir.path());
    config.crawler.start_urls = vec![format!("{}/old", base)];
    let mut coordinator = Coordinator::new(config)
        .unwrap()
        .with_extractor(Box::new(RecordingExtractor { seen: seen.clone() }));
    let stats = coordinator.run().await.unwrap();

    let final_url = format!("{}/new", base);
    assert_eq!(*seen.lock().unwrap(), vec![final_url.clone()]);

    let expected = format!("stub {}", final_url);
    let records = records(dir.path());
    assert_eq!(records[0].markdown_bytes, Some(expected.len() as u64));
    assert_eq!(stats.total_markdown_bytes, expected.len() as u64);

    let stored = std::fs::read_to_string(dir.path().join(document_path(&final_url))).unwrap();
    assert_eq!(stored, expected);
}

#[tokio::test]
async fn test_non_html_is_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", html_page("Home", r#"<a href="/report">Report</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    let records = records(dir.path());
    let non_html = &records[1];
    assert_eq!(non_html.status, OutcomeStatus::NonHtml);
    assert_eq!(non_html.url, format!("{}/report", base));
    assert_eq!(non_html.http_status, Some(200));
    assert!(non_html
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("application/pdf"));
    assert_eq!(stats.outcomes.skipped_non_html, 1);
    assert_eq!(stats.pages_written, 1);
}

#[tokio::test]
async fn test_transport_failure_is_recorded() {
    let dir = TempDir::new().unwrap();
    // Nothing listens on the discard port
    let mut config = test_config("http://127.0.0.1:9", dir.path());
    config.crawler.timeout = 2;

    let mut coordinator = Coordinator::new(config).unwrap();
    let stats = coordinator.run().await.unwrap();

    let records = records(dir.path());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, OutcomeStatus::RequestFailed);
    assert_eq!(stats.outcomes.request_failed, 1);
    assert_eq!(stats.stop_reason, StopReason::QueueExhausted);
}

#[tokio::test]
async fn test_failed_requests_still_spaced() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config("http://127.0.0.1:9", dir.path());
    config.crawler.start_urls = vec![
        "http://127.0.0.1:9/a".to_string(),
        "http://127.0.0.1:9/b".to_string(),
    ];
    config.crawler.delay = 0.3;
    config.crawler.timeout = 2;

    let start = Instant::now();
    let stats = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(stats.outcomes.request_failed, 2);
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_byte_budget_is_never_exceeded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let filler = "x".repeat(1000);

    mount_page(
        &server,
        "/",
        html_page("One", &format!(r#"<p>{}</p><a href="/two">next</a>"#, filler)),
    )
    .await;
    mount_page(
        &server,
        "/two",
        html_page("Two", &format!(r#"<p>{}</p><a href="/three">next</a>"#, filler)),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/three"))
        .respond_with(html_page("Three", "<p>never</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&base, dir.path());
    config.crawler.max_bytes = 1500;
    let mut coordinator = Coordinator::new(config).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.stop_reason, StopReason::ByteBudget);
    assert_eq!(stats.pages_written, 1);
    assert!(stats.total_markdown_bytes <= 1500);

    let records = records(dir.path());
    assert_eq!(records.len(), 1);
    assert!(records
        .iter()
        .all(|r| r.total_bytes.unwrap_or(0) <= 1500));
    // The page that would have overflowed is not marked visited
    assert!(!coordinator.visited().contains(&format!("{}/two", base)));
}

#[tokio::test]
async fn test_page_limit() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", html_page("0", r#"<a href="/1">1</a>"#)).await;
    mount_page(&server, "/1", html_page("1", r#"<a href="/2">2</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(html_page("2", r#"<a href="/3">3</a>"#))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&base, dir.path());
    config.crawler.max_pages = 2;
    let mut coordinator = Coordinator::new(config).unwrap();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.stop_reason, StopReason::PageLimit);
    assert_eq!(stats.pages_written, 2);
    assert_eq!(stats.queue_remaining, 1);
}

#[tokio::test]
async fn test_no_url_fetched_twice() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    // Every page links to every other page, with noise that normalizes away
    let links = r##"<a href="/">h</a> <a href="/a#x">a</a> <a href="/b?ref=home">b</a>
                    <a href="/c">c</a> <a href="/a?utm_campaign=z">a2</a>"##;
    for route in ["/", "/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html_page(route, links))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    let urls: Vec<String> = records(dir.path()).into_iter().map(|r| r.url).collect();
    let unique: HashSet<&String> = urls.iter().collect();
    assert_eq!(urls.len(), 4);
    assert_eq!(unique.len(), 4);
    assert_eq!(stats.pages_written, 4);
}

#[tokio::test]
async fn test_requests_to_one_host_are_spaced() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", html_page("0", r#"<a href="/1">1</a>"#)).await;
    mount_page(&server, "/1", html_page("1", r#"<a href="/2">2</a>"#)).await;
    mount_page(&server, "/2", html_page("2", "")).await;

    let mut config = test_config(&base, dir.path());
    config.crawler.delay = 0.2;
    let mut coordinator = Coordinator::new(config).unwrap();

    let start = Instant::now();
    let stats = coordinator.run().await.unwrap();

    assert_eq!(stats.pages_written, 3);
    assert!(start.elapsed() >= Duration::from_millis(400));
}
