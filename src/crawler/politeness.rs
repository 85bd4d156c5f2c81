//! Per-host politeness: robots.txt rules and request spacing
//!
//! One [`Politeness`] value is owned by each crawl, so independent crawls in
//! the same process never share robots caches or request timestamps.

use crate::crawler::Fetcher;
use crate::robots::{fetch_robots, is_allowed};
use crate::state::HostState;
use crate::url::host_key;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Robots cache and throttle state for every host seen in a run
#[derive(Debug)]
pub struct Politeness {
    fetcher: Fetcher,
    user_agent: String,
    configured_delay: Duration,
    hosts: HashMap<String, HostState>,
}

impl Politeness {
    /// Creates an empty controller
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Used to retrieve robots.txt
    /// * `user_agent` - The agent robots rules are evaluated for
    /// * `configured_delay` - Minimum spacing between requests to one host
    pub fn new(fetcher: Fetcher, user_agent: &str, configured_delay: Duration) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.to_string(),
            configured_delay,
            hosts: HashMap::new(),
        }
    }

    /// Returns the politeness state of the host serving `url`
    ///
    /// robots.txt is fetched on first access and cached for the rest of the
    /// run. Returns None only for URLs without a host.
    pub async fn policy_for(&mut self, url: &Url) -> Option<&HostState> {
        let key = host_key(url)?;

        if !self.hosts.contains_key(&key) {
            let robots = fetch_robots(&self.fetcher, url).await;
            let state = HostState::new(robots, &self.user_agent);
            if let Some(delay) = state.crawl_delay {
                tracing::debug!("{} asks for a crawl delay of {:?}", key, delay);
            }
            self.hosts.insert(key.clone(), state);
        }

        self.hosts.get(&key)
    }

    /// Checks robots rules for `url`, resolving the host policy if needed
    pub async fn can_fetch(&mut self, url: &Url) -> bool {
        let user_agent = self.user_agent.clone();
        match self.policy_for(url).await {
            Some(state) => is_allowed(&state.robots, url.as_str(), &user_agent),
            None => false,
        }
    }

    /// Waits until the host serving `url` may receive another request
    ///
    /// The wait is bounded by the larger of the configured delay and the
    /// host's robots crawl-delay.
    pub async fn throttle(&self, url: &Url) {
        let Some(key) = host_key(url) else {
            return;
        };
        let Some(state) = self.hosts.get(&key) else {
            return;
        };

        let delay = state.effective_delay(self.configured_delay);
        if let Some(wait) = state.time_until_next_request(delay, Instant::now()) {
            tracing::trace!("Throttling {} for {:?}", key, wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Records that a fetch attempt to the host serving `url` just finished
    ///
    /// Called after every attempt, failed ones included.
    pub fn record_attempt(&mut self, url: &Url) {
        let Some(key) = host_key(url) else {
            return;
        };
        self.hosts
            .entry(key)
            .or_insert_with(HostState::allow_all)
            .record_request(Instant::now());
    }

    /// The spacing actually enforced for the host serving `url`
    pub fn effective_delay(&self, url: &Url) -> Duration {
        host_key(url)
            .and_then(|key| self.hosts.get(&key))
            .map(|state| state.effective_delay(self.configured_delay))
            .unwrap_or(self.configured_delay)
    }
}
