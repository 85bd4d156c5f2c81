//! Filesystem storage backend
//!
//! Layout of the output directory:
//!
//! ```text
//! <root>/
//!   pages/<2 hex>/<sha256 hex>.md   one document per final URL
//!   meta.jsonl                      append-only outcome log
//!   stats.json                      end-of-run summary
//! ```

use crate::output::CrawlStats;
use crate::storage::traits::{PriorState, Storage, StorageError, StorageResult};
use crate::storage::OutcomeRecord;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Directory holding the sharded documents
pub const PAGES_DIR: &str = "pages";

/// Outcome log file name
pub const META_FILE: &str = "meta.jsonl";

/// Run summary file name
pub const STATS_FILE: &str = "stats.json";

/// Extension of stored documents
pub const DOCUMENT_EXTENSION: &str = "md";

/// Storage rooted at an output directory
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
    meta: File,
}

impl FsStorage {
    /// Opens (creating if needed) an output directory
    ///
    /// Fails if the directory cannot be created or the outcome log cannot be
    /// opened for appending. Existing content is kept.
    pub fn open(root: &Path) -> StorageResult<Self> {
        if root.exists() && !root.is_dir() {
            return Err(StorageError::Layout(format!(
                "{} exists and is not a directory",
                root.display()
            )));
        }
        fs::create_dir_all(root.join(PAGES_DIR))?;

        let meta = OpenOptions::new()
            .create(true)
            .append(true)
            .open(root.join(META_FILE))?;

        tracing::debug!("Opened output directory {}", root.display());
        Ok(Self {
            root: root.to_path_buf(),
            meta,
        })
    }

    /// The output directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the outcome log
    pub fn meta_path(&self) -> PathBuf {
        self.root.join(META_FILE)
    }

    /// Path of the run summary
    pub fn stats_path(&self) -> PathBuf {
        self.root.join(STATS_FILE)
    }
}

impl Storage for FsStorage {
    fn store_document(&mut self, final_url: &str, document: &str) -> StorageResult<String> {
        let relative = document_path(final_url);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, document)?;
        Ok(relative)
    }

    fn append_record(&mut self, record: &OutcomeRecord) -> StorageResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.meta.write_all(line.as_bytes())?;
        self.meta.flush()?;
        Ok(())
    }

    fn write_final_stats(&mut self, stats: &CrawlStats) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(stats)?;
        fs::write(self.stats_path(), json)?;
        Ok(())
    }

    fn load_prior_state(&self) -> StorageResult<PriorState> {
        load_prior_state(&self.meta_path())
    }
}

/// Location of the document for `final_url`, relative to the output root
///
/// ```
/// use sumi_scribe::storage::document_path;
///
/// let path = document_path("https://example.com/");
/// assert!(path.starts_with("pages/"));
/// assert!(path.ends_with(".md"));
/// ```
pub fn document_path(final_url: &str) -> String {
    let digest = hex::encode(Sha256::digest(final_url.as_bytes()));
    format!(
        "{}/{}/{}.{}",
        PAGES_DIR,
        &digest[..2],
        digest,
        DOCUMENT_EXTENSION
    )
}

/// The fields resume needs; everything else on the line is ignored
#[derive(Debug, Deserialize)]
struct ResumeRow {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    requested_url: Option<String>,
    #[serde(default)]
    markdown_bytes: Option<u64>,
}

/// Replays an outcome log into the visited set and byte total
///
/// Blank and malformed lines are skipped. A missing file yields an empty
/// state; any other read failure is returned.
pub fn load_prior_state(meta_path: &Path) -> StorageResult<PriorState> {
    let mut state = PriorState::default();

    let file = match File::open(meta_path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(state),
        Err(e) => return Err(e.into()),
    };

    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row: ResumeRow = match serde_json::from_str(line) {
            Ok(row) => row,
            Err(e) => {
                tracing::debug!("Skipping malformed meta line: {}", e);
                state.skipped_lines += 1;
                continue;
            }
        };

        let urls = row.url.into_iter().chain(row.requested_url);
        state.visited.extend(urls.filter(|u| !u.is_empty()));
        state.bytes_written = state
            .bytes_written
            .saturating_add(row.markdown_bytes.unwrap_or(0));
    }

    Ok(state)
}

/// Reads every well-formed record of an outcome log, in order
pub fn read_records(meta_path: &Path) -> StorageResult<Vec<OutcomeRecord>> {
    let file = match File::open(meta_path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Ok(record) = serde_json::from_str::<OutcomeRecord>(line.trim()) {
            records.push(record);
        }
    }
    Ok(records)
}
