//! Shared fixtures for the integration tests

use std::path::Path;
use sumi_scribe::config::{Config, CrawlerConfig, OutputConfig};
use sumi_scribe::storage::{read_records, OutcomeRecord, META_FILE};
use wiremock::ResponseTemplate;

/// Creates a test configuration seeded at the root of `server_uri`
///
/// No delay and no sitemap seeding, so tests only see the requests they mock.
pub fn test_config(server_uri: &str, output_dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_urls: vec![format!("{}/", server_uri)],
            delay: 0.0,
            timeout: 5,
            user_agent: "TestBot/1.0".to_string(),
            use_sitemaps: false,
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            directory: output_dir.to_path_buf(),
        },
    }
}

/// An HTML page response
pub fn html_page(title: &str, body: &str) -> ResponseTemplate {
    html_page_with_status(200, title, body)
}

pub fn html_page_with_status(status: u16, title: &str, body: &str) -> ResponseTemplate {
    let html = format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    );
    ResponseTemplate::new(status).set_body_raw(html.into_bytes(), "text/html; charset=utf-8")
}

/// Every record in the output directory's meta.jsonl
pub fn records(output_dir: &Path) -> Vec<OutcomeRecord> {
    read_records(&output_dir.join(META_FILE)).expect("meta.jsonl should be readable")
}
