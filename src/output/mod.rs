//! Output module for crawl summaries
//!
//! This module handles:
//! - The `stats.json` summary written at the end of a run
//! - Summaries replayed from `meta.jsonl` for the `--stats` mode
//! - Printing both to the terminal

pub mod stats;

pub use stats::{
    load_statistics, print_statistics, summarize_records, CrawlStats, OutcomeCounts,
    RecordSummary,
};
