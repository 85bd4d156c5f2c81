//! Run statistics
//!
//! [`CrawlStats`] is the `stats.json` summary written at the end of every run.
//! [`RecordSummary`] is computed from `meta.jsonl` alone and covers every run
//! that wrote to the directory.

use crate::crawler::StopReason;
use crate::state::OutcomeStatus;
use crate::storage::{load_prior_state, read_records, META_FILE, STATS_FILE};
use crate::ScribeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Counts of non-ok outcomes in one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub skipped_non_html: u64,
    pub blocked_by_robots: u64,
    pub request_failed: u64,
    pub redirected_off_domain: u64,
    #[serde(default)]
    pub redirected_to_visited: u64,
}

impl OutcomeCounts {
    /// Counts one outcome (ok outcomes are tracked by the budget instead)
    pub fn tally(&mut self, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Ok => {}
            OutcomeStatus::NonHtml => self.skipped_non_html += 1,
            OutcomeStatus::BlockedByRobots => self.blocked_by_robots += 1,
            OutcomeStatus::RequestFailed => self.request_failed += 1,
            OutcomeStatus::RedirectedOffDomain => self.redirected_off_domain += 1,
            OutcomeStatus::RedirectedToVisited => self.redirected_to_visited += 1,
        }
    }
}

/// End-of-run summary, serialized as `stats.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Pages written in this run
    pub pages_written: u64,

    /// Document bytes in the output directory, prior runs included
    pub total_markdown_bytes: u64,

    #[serde(flatten)]
    pub outcomes: OutcomeCounts,

    /// URLs still pending when the run stopped
    pub queue_remaining: u64,

    pub base_host: String,
    pub include_subdomains: bool,
    pub max_bytes: u64,
    pub max_pages: u64,
    pub stop_reason: StopReason,
    pub started_at: String,
    pub ended_at: String,
}

/// Aggregate view of an outcome log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSummary {
    /// Well-formed records by status
    pub by_status: HashMap<OutcomeStatus, u64>,

    /// Distinct URLs a resumed run would skip
    pub visited: u64,

    /// Sum of `markdown_bytes` a resumed run would start from
    pub markdown_bytes: u64,

    /// Lines a resumed run would ignore
    pub malformed_lines: u64,
}

impl RecordSummary {
    /// Number of records with the given status
    pub fn count(&self, status: OutcomeStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Number of well-formed records
    pub fn total(&self) -> u64 {
        self.by_status.values().sum()
    }
}

/// Loads `stats.json` from an output directory
///
/// # Returns
///
/// * `Ok(Some(stats))` - The last run's summary
/// * `Ok(None)` - No run has finished in this directory
/// * `Err(ScribeError)` - The file exists but could not be read or parsed
pub fn load_statistics(output_dir: &Path) -> Result<Option<CrawlStats>, ScribeError> {
    let path = output_dir.join(STATS_FILE);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let stats = serde_json::from_str(&contents)
        .map_err(|e| ScribeError::Storage(crate::storage::StorageError::Serialization(e)))?;
    Ok(Some(stats))
}

/// Replays `meta.jsonl` from an output directory into a summary
pub fn summarize_records(output_dir: &Path) -> Result<RecordSummary, ScribeError> {
    let meta_path = output_dir.join(META_FILE);
    let prior = load_prior_state(&meta_path)?;

    let mut by_status = HashMap::new();
    for record in read_records(&meta_path)? {
        *by_status.entry(record.status).or_insert(0) += 1;
    }

    Ok(RecordSummary {
        by_status,
        visited: prior.visited.len() as u64,
        markdown_bytes: prior.bytes_written,
        malformed_lines: prior.skipped_lines as u64,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: Option<&CrawlStats>, records: &RecordSummary) {
    println!("=== Crawl Statistics ===\n");

    match stats {
        Some(stats) => {
            println!("Last run ({} -> {}):", stats.started_at, stats.ended_at);
            println!("  Base host: {}", stats.base_host);
            println!("  Include subdomains: {}", stats.include_subdomains);
            println!("  Stop reason: {}", stats.stop_reason);
            println!("  Pages written: {}", stats.pages_written);
            println!(
                "  Markdown bytes: {} of {}",
                stats.total_markdown_bytes, stats.max_bytes
            );
            println!("  Skipped non-HTML: {}", stats.outcomes.skipped_non_html);
            println!("  Blocked by robots: {}", stats.outcomes.blocked_by_robots);
            println!("  Request failures: {}", stats.outcomes.request_failed);
            println!(
                "  Redirected off domain: {}",
                stats.outcomes.redirected_off_domain
            );
            println!(
                "  Redirected to visited: {}",
                stats.outcomes.redirected_to_visited
            );
            println!("  Queue remaining: {}", stats.queue_remaining);
        }
        None => println!("No completed run found (stats.json missing)."),
    }
    println!();

    println!("Outcome log:");
    println!("  Records: {}", records.total());
    let mut counts: Vec<_> = records.by_status.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    for (status, count) in counts {
        let percentage = if records.total() > 0 {
            (*count as f64 / records.total() as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!("  Visited URLs: {}", records.visited);
    println!("  Markdown bytes: {}", records.markdown_bytes);
    if records.malformed_lines > 0 {
        println!("  Malformed lines: {}", records.malformed_lines);
    }
}
