/// Outcome definitions for crawled URLs
///
/// Every URL that leaves the frontier and reaches the fetch path ends in exactly
/// one of these states. All of them are terminal for the run.
use serde::{Deserialize, Serialize};
use std::fmt;

/// The terminal outcome of a URL, as written to `meta.jsonl`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Page was fetched, converted and stored
    Ok,

    /// robots.txt disallows the URL for our user agent
    BlockedByRobots,

    /// Transport failure (connect error, timeout, body read error)
    RequestFailed,

    /// Redirects ended on a host outside the crawl scope
    RedirectedOffDomain,

    /// Response was not an HTML document
    NonHtml,

    /// Redirects ended on a URL that already had an outcome
    RedirectedToVisited,
}

impl OutcomeStatus {
    /// String form used in `meta.jsonl`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::BlockedByRobots => "blocked_by_robots",
            Self::RequestFailed => "request_failed",
            Self::RedirectedOffDomain => "redirected_off_domain",
            Self::NonHtml => "non_html",
            Self::RedirectedToVisited => "redirected_to_visited",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
