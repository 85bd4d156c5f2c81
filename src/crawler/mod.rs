//! Crawler module: the crawl engine
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - HTML parsing and link extraction
//! - The FIFO frontier
//! - Per-host politeness (robots.txt and throttling)
//! - Overall crawl coordination and budget enforcement

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod politeness;

pub use coordinator::{prepare_seeds, run_crawl, Coordinator, StepOutcome, StopReason};
pub use fetcher::{
    build_http_client, fetch_url, is_html_content_type, FetchResult, FetchedResponse, Fetcher,
};
pub use frontier::Frontier;
pub use parser::extract_links;
pub use politeness::Politeness;

pub(crate) use parser::extract_title;
