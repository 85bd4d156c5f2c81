//! Outcome records written to `meta.jsonl`

use crate::state::OutcomeStatus;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One line of `meta.jsonl`
///
/// Optional fields are omitted from the JSON when absent, so each status only
/// carries the fields that mean something for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Canonical URL the outcome belongs to (the final URL for fetched pages)
    pub url: String,

    pub status: OutcomeStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Document location relative to the output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_path: Option<String>,

    /// Size of the stored document in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_bytes: Option<u64>,

    /// Cumulative document bytes after this write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,

    /// Final URL of a redirect that was not followed into storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,

    /// URL taken from the frontier, when redirects moved it to `url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_url: Option<String>,

    /// RFC 3339 timestamp
    pub fetched_at: String,
}

impl OutcomeRecord {
    fn bare(url: &str, status: OutcomeStatus) -> Self {
        Self {
            url: url.to_string(),
            status,
            http_status: None,
            content_type: None,
            markdown_path: None,
            markdown_bytes: None,
            total_bytes: None,
            redirect: None,
            requested_url: None,
            fetched_at: timestamp_now(),
        }
    }

    /// A stored page
    pub fn ok(
        url: &str,
        http_status: u16,
        content_type: &str,
        markdown_path: &str,
        markdown_bytes: u64,
        total_bytes: u64,
        fetched_at: &str,
    ) -> Self {
        Self {
            http_status: Some(http_status),
            content_type: Some(content_type.to_string()),
            markdown_path: Some(markdown_path.to_string()),
            markdown_bytes: Some(markdown_bytes),
            total_bytes: Some(total_bytes),
            fetched_at: fetched_at.to_string(),
            ..Self::bare(url, OutcomeStatus::Ok)
        }
    }

    /// A URL robots.txt forbids
    pub fn blocked_by_robots(url: &str) -> Self {
        Self::bare(url, OutcomeStatus::BlockedByRobots)
    }

    /// A fetch that failed at the transport level
    pub fn request_failed(url: &str) -> Self {
        Self::bare(url, OutcomeStatus::RequestFailed)
    }

    /// A fetch whose redirects left the crawl scope
    pub fn redirected_off_domain(url: &str, final_url: &str, http_status: u16) -> Self {
        Self {
            redirect: Some(final_url.to_string()),
            http_status: Some(http_status),
            ..Self::bare(url, OutcomeStatus::RedirectedOffDomain)
        }
    }

    /// A response that is not an HTML document
    pub fn non_html(url: &str, http_status: u16, content_type: &str) -> Self {
        Self {
            http_status: Some(http_status),
            content_type: Some(content_type.to_string()),
            ..Self::bare(url, OutcomeStatus::NonHtml)
        }
    }

    /// A fetch whose redirects ended on a URL that already has an outcome
    pub fn redirected_to_visited(url: &str, final_url: &str, http_status: u16) -> Self {
        Self {
            redirect: Some(final_url.to_string()),
            http_status: Some(http_status),
            ..Self::bare(url, OutcomeStatus::RedirectedToVisited)
        }
    }

    /// Notes the frontier URL that redirected to this record's URL
    ///
    /// Does nothing when the two are the same.
    pub fn with_requested_url(mut self, requested_url: &str) -> Self {
        if requested_url != self.url {
            self.requested_url = Some(requested_url.to_string());
        }
        self
    }

    /// Every URL this record gives a terminal outcome
    pub fn visited_urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.url.as_str()).chain(self.requested_url.as_deref())
    }
}

/// Current UTC time in the format used for `fetched_at`
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
