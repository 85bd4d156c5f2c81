//! Storage module for persisting crawl results
//!
//! This module handles everything the crawler writes to disk:
//! - Markdown documents, content-addressed by the SHA-256 of their final URL
//! - The append-only `meta.jsonl` outcome log
//! - The `stats.json` run summary
//! - Replaying the outcome log to resume a crawl

mod fs;
mod record;
mod traits;

pub use fs::{
    document_path, load_prior_state, read_records, FsStorage, DOCUMENT_EXTENSION, META_FILE,
    PAGES_DIR, STATS_FILE,
};
pub use record::{timestamp_now, OutcomeRecord};
pub use traits::{PriorState, Storage, StorageError, StorageResult};

use crate::ScribeError;
use std::path::Path;

/// Opens the output directory for a run
///
/// This is the only storage failure that happens before any fetching.
pub fn open_storage(root: &Path) -> Result<FsStorage, ScribeError> {
    Ok(FsStorage::open(root)?)
}
