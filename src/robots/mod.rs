//! Robots.txt handling module
//!
//! This module provides functionality for fetching and parsing robots.txt files.
//! Fetching fails open: a robots.txt that cannot be retrieved, or that comes
//! back with a non-success status, means the host is fully allowed.

mod parser;

pub use parser::{product_token, ParsedRobots};

use crate::crawler::{FetchResult, Fetcher};
use crate::url::robots_url;
use url::Url;

/// Fetches and parses robots.txt for the origin of `page_url`
///
/// # Arguments
///
/// * `fetcher` - The HTTP fetcher (already configured with timeout and user agent)
/// * `page_url` - Any URL on the host whose robots.txt should be read
///
/// # Returns
///
/// The parsed rules, or an allow-all policy if robots.txt is unavailable.
pub async fn fetch_robots(fetcher: &Fetcher, page_url: &Url) -> ParsedRobots {
    let Some(robots_url) = robots_url(page_url) else {
        return ParsedRobots::allow_all();
    };

    match fetcher.fetch(robots_url.as_str()).await {
        FetchResult::Response(response) if response.is_success() => {
            tracing::debug!("Fetched robots.txt from {}", robots_url);
            ParsedRobots::from_content(&response.text())
        }
        FetchResult::Response(response) => {
            tracing::debug!(
                "robots.txt at {} returned HTTP {}, treating host as fully allowed",
                robots_url,
                response.status_code
            );
            ParsedRobots::allow_all()
        }
        FetchResult::Failed { error } => {
            tracing::warn!(
                "Could not fetch {} ({}), treating host as fully allowed",
                robots_url,
                error
            );
            ParsedRobots::allow_all()
        }
    }
}

/// Checks if a URL is allowed by robots.txt
pub fn is_allowed(robots: &ParsedRobots, url: &str, user_agent: &str) -> bool {
    robots.is_allowed(url, user_agent)
}
