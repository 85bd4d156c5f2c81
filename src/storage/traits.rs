//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::output::CrawlStats;
use crate::storage::OutcomeRecord;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid output layout: {0}")]
    Layout(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// State reconstructed by replaying a prior run's outcome log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorState {
    /// Every URL with a terminal outcome
    pub visited: HashSet<String>,

    /// Sum of `markdown_bytes` across all records
    pub bytes_written: u64,

    /// Lines that could not be parsed and were skipped
    pub skipped_lines: usize,
}

/// Trait for storage backend implementations
///
/// The crawl engine only needs these four operations; where and how the data
/// lands is up to the implementation.
pub trait Storage {
    /// Persists a document and returns its location relative to the output root
    ///
    /// # Arguments
    ///
    /// * `final_url` - Canonical URL the document was fetched from (the content key)
    /// * `document` - The document text
    fn store_document(&mut self, final_url: &str, document: &str) -> StorageResult<String>;

    /// Appends one outcome record, durably, before returning
    fn append_record(&mut self, record: &OutcomeRecord) -> StorageResult<()>;

    /// Writes the end-of-run summary, replacing any previous one
    fn write_final_stats(&mut self, stats: &CrawlStats) -> StorageResult<()>;

    /// Replays the outcome log of earlier runs
    ///
    /// Malformed lines are skipped. A missing log yields an empty state.
    fn load_prior_state(&self) -> StorageResult<PriorState>;
}
