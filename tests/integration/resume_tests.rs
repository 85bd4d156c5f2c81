use crate::common::{html_page, records, test_config};
use std::collections::HashSet;
use sumi_scribe::crawler::{Coordinator, StopReason};
use sumi_scribe::state::OutcomeStatus;
use sumi_scribe::storage::{load_prior_state, META_FILE};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_resume_skips_visited_and_accumulates_bytes() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    // Fetched once across both runs
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/a">A</a> <a href="/b">B</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", "<p>first</p>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page("B", "<p>second</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&base, dir.path());
    config.crawler.max_pages = 2;
    let first = Coordinator::new(config.clone())
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(first.stop_reason, StopReason::PageLimit);
    assert_eq!(first.pages_written, 2);

    // The frontier is not persisted, so the page left pending is given as a seed
    config.crawler.max_pages = 0;
    config.crawler.resume = true;
    config.crawler.start_urls = vec![format!("{}/", base), format!("{}/b", base)];
    let mut coordinator = Coordinator::new(config).unwrap();
    assert!(coordinator.visited().contains(&format!("{}/", base)));
    assert!(coordinator.visited().contains(&format!("{}/a", base)));
    assert_eq!(coordinator.budget().bytes_written, first.total_markdown_bytes);

    let second = coordinator.run().await.unwrap();
    assert_eq!(second.stop_reason, StopReason::QueueExhausted);
    assert_eq!(second.pages_written, 1);

    let records = records(dir.path());
    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base).as_str(),
            format!("{}/a", base).as_str(),
            format!("{}/b", base).as_str(),
        ]
    );

    let sum: u64 = records.iter().filter_map(|r| r.markdown_bytes).sum();
    assert_eq!(second.total_markdown_bytes, sum);
    assert_eq!(records[2].total_bytes, Some(sum));
}

#[tokio::test]
async fn test_replay_matches_log() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /no\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/x">X</a> <a href="/no">No</a> <a href="/file">File</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(html_page("X", "<p>x</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"))
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(test_config(&base, dir.path())).unwrap();
    let stats = coordinator.run().await.unwrap();

    let records = records(dir.path());
    let prior = load_prior_state(&dir.path().join(META_FILE)).unwrap();

    let logged: HashSet<String> = records.iter().map(|r| r.url.clone()).collect();
    assert_eq!(prior.visited, logged);
    assert_eq!(prior.skipped_lines, 0);

    let ok_bytes: u64 = records
        .iter()
        .filter(|r| r.status == OutcomeStatus::Ok)
        .filter_map(|r| r.markdown_bytes)
        .sum();
    assert_eq!(prior.bytes_written, ok_bytes);
    assert_eq!(prior.bytes_written, stats.total_markdown_bytes);

    assert!(records.iter().any(|r| r.status == OutcomeStatus::BlockedByRobots));
    assert!(records.iter().any(|r| r.status == OutcomeStatus::NonHtml));
}

#[tokio::test]
async fn test_resume_tolerates_truncated_log() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    // A crash left a partial last line
    std::fs::write(
        dir.path().join(META_FILE),
        format!(
            "{{\"url\":\"{}/\",\"status\":\"ok\",\"markdown_bytes\":10}}\n{{\"url\":\"{}/a\",\"sta",
            base, base
        ),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", ""))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&base, dir.path());
    config.crawler.resume = true;
    let mut coordinator = Coordinator::new(config).unwrap();

    assert_eq!(coordinator.budget().bytes_written, 10);
    assert!(!coordinator.visited().contains(&format!("{}/a", base)));

    let stats = coordinator.run().await.unwrap();
    assert_eq!(stats.pages_written, 0);
    assert_eq!(stats.total_markdown_bytes, 10);
}

#[tokio::test]
async fn test_fresh_run_appends_to_existing_log() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", ""))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        Coordinator::new(test_config(&base, dir.path()))
            .unwrap()
            .run()
            .await
            .unwrap();
    }

    let records = records(dir.path());
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.url == format!("{}/", base)));
}

#[tokio::test]
async fn test_redirect_sources_survive_resume() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/old">Old</a> <a href="/alias">Alias</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    for route in ["/old", "/alias"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", base).as_str()),
            )
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page("New", "<p>moved</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&base, dir.path());
    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    coordinator.run().await.unwrap();

    let prior = load_prior_state(&dir.path().join(META_FILE)).unwrap();
    assert_eq!(coordinator.visited(), &prior.visited);
    assert_eq!(prior.visited.len(), 4);

    let records = records(dir.path());
    let moved = records.iter().find(|r| r.url == format!("{}/new", base)).unwrap();
    assert_eq!(moved.requested_url, Some(format!("{}/old", base)));
    let alias = records
        .iter()
        .find(|r| r.status == OutcomeStatus::RedirectedToVisited)
        .unwrap();
    assert_eq!(alias.url, format!("{}/alias", base));
    assert_eq!(alias.redirect, Some(format!("{}/new", base)));

    // Every URL of the first run is skipped without a request
    config.crawler.resume = true;
    config.crawler.start_urls = vec![
        format!("{}/", base),
        format!("{}/old", base),
        format!("{}/alias", base),
    ];
    let second = Coordinator::new(config).unwrap().run().await.unwrap();
    assert_eq!(second.pages_written, 0);
    assert_eq!(crate::common::records(dir.path()).len(), records.len());
}
