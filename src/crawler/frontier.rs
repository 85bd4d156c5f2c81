//! Crawl frontier: the FIFO queue of canonical URLs awaiting fetch
//!
//! Ordering is strictly breadth-first, first discovered, first fetched. A URL
//! already waiting in the queue is not enqueued a second time; whether it has
//! been visited is the coordinator's concern.

use std::collections::{HashSet, VecDeque};

/// FIFO queue with pending-set de-duplication
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    pending: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a URL to the back of the queue
    ///
    /// Returns false if the URL was already pending.
    pub fn push(&mut self, url: String) -> bool {
        if !self.pending.insert(url.clone()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Removes the URL at the front of the queue
    pub fn pop(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.pending.remove(&url);
        Some(url)
    }

    /// Number of pending URLs
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending URLs in fetch order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }
}
