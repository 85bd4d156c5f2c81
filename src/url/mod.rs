//! URL handling module for Sumi-Scribe
//!
//! This module provides URL normalization, crawl scope checks, asset-extension
//! filtering and the host helpers used to key per-host politeness state.
//! Everything here is a pure function: malformed input yields `None` or
//! `false`, never an error.

mod domain;
mod filter;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{extract_host, host_key, robots_url};
pub use filter::is_skippable;
pub use normalize::normalize;
pub use scope::{base_host, is_in_scope, CrawlScope};

/// Checks whether a canonical URL may enter the frontier
///
/// A URL is admitted when it is in scope and does not point at a skippable
/// asset.
pub fn is_crawlable(url: &str, scope: &CrawlScope) -> bool {
    is_in_scope(url, scope) && !is_skippable(url)
}
