/// Byte and page ceilings for one run
///
/// `bytes_written` never exceeds `max_bytes`: a write is checked with
/// [`RunBudget::would_overflow`] before it is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBudget {
    /// Maximum Markdown bytes across the output directory
    pub max_bytes: u64,

    /// Maximum pages written in this run (0 = unbounded)
    pub max_pages: u64,

    /// Markdown bytes written so far, including bytes replayed on resume
    pub bytes_written: u64,

    /// Pages written in this run
    pub pages_written: u64,
}

impl RunBudget {
    /// Creates a budget with nothing written yet
    pub fn new(max_bytes: u64, max_pages: u64) -> Self {
        Self {
            max_bytes,
            max_pages,
            bytes_written: 0,
            pages_written: 0,
        }
    }

    /// Starts the byte counter from a prior run's total
    pub fn with_prior_bytes(mut self, bytes: u64) -> Self {
        self.bytes_written = bytes;
        self
    }

    /// True once the page limit has been reached
    pub fn pages_exhausted(&self) -> bool {
        self.max_pages > 0 && self.pages_written >= self.max_pages
    }

    /// True once the byte budget has been reached
    pub fn bytes_exhausted(&self) -> bool {
        self.bytes_written >= self.max_bytes
    }

    /// True if writing `size` more bytes would go past the budget
    pub fn would_overflow(&self, size: u64) -> bool {
        self.bytes_written.saturating_add(size) > self.max_bytes
    }

    /// Commits a written page and returns the new byte total
    ///
    /// Callers must have checked [`RunBudget::would_overflow`] first.
    pub fn commit(&mut self, size: u64) -> u64 {
        debug_assert!(!self.would_overflow(size));
        self.bytes_written += size;
        self.pages_written += 1;
        self.bytes_written
    }
}
