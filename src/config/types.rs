use crate::config::parser::deserialize_byte_size;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default byte budget: 5 GiB of Markdown
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "SumiScribe/1.0";

/// Main configuration structure for Sumi-Scribe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Seed URLs; the first one defines the crawl scope
    pub start_urls: Vec<String>,

    /// Stop once this many Markdown bytes have been written
    #[serde(deserialize_with = "deserialize_byte_size")]
    pub max_bytes: u64,

    /// Stop after this many HTML pages (0 = unbounded)
    pub max_pages: u64,

    /// Minimum delay between requests to the same host (seconds)
    pub delay: f64,

    /// User-Agent header and robots.txt agent
    pub user_agent: String,

    /// Request timeout (seconds)
    pub timeout: u64,

    /// Treat every subdomain of the base host as in scope
    pub include_subdomains: bool,

    /// Seed the frontier from robots.txt sitemaps
    pub use_sitemaps: bool,

    /// Extra sitemap URLs to seed from
    pub sitemaps: Vec<String>,

    /// Upper bound on sitemap-seeded URLs
    pub max_sitemap_urls: Option<usize>,

    /// Replay meta.jsonl before crawling
    pub resume: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_urls: Vec::new(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_pages: 0,
            delay: 1.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: 20,
            include_subdomains: false,
            use_sitemaps: true,
            sitemaps: Vec::new(),
            max_sitemap_urls: None,
            resume: false,
        }
    }
}

impl CrawlerConfig {
    /// Configured per-host delay as a Duration
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay.max(0.0)).unwrap_or(Duration::ZERO)
    }

    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory holding pages/, meta.jsonl and stats.json
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/crawl"),
        }
    }
}
