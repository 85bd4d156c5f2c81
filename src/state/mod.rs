//! State module for tracking crawl progress
//!
//! This module provides the state the crawl engine keeps for a run.
//!
//! # Components
//!
//! - `OutcomeStatus`: terminal outcome of a URL (ok, blocked, failed, ...)
//! - `HostState`: per-host robots rules, crawl delay and last request time
//! - `RunBudget`: byte and page ceilings with the running counters

mod budget;
mod host_state;
mod outcome;

// Re-export main types
pub use budget::RunBudget;
pub use host_state::HostState;
pub use outcome::OutcomeStatus;
