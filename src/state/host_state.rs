use crate::robots::ParsedRobots;
use std::time::Duration;
use tokio::time::Instant;

/// Politeness state for one host
///
/// Created lazily the first time a URL on the host is about to be fetched and
/// kept for the rest of the run; robots rules are never refreshed mid-run.
#[derive(Debug, Clone)]
pub struct HostState {
    /// Parsed robots.txt rules (allow-all when robots.txt was unavailable)
    pub robots: ParsedRobots,

    /// Crawl-delay that robots.txt asks of our user agent
    pub crawl_delay: Option<Duration>,

    /// When the last fetch attempt to this host finished
    pub last_request_time: Option<Instant>,

    /// `Sitemap:` directives found in robots.txt
    pub sitemaps: Vec<String>,
}

impl HostState {
    /// Builds the state for a host from its robots.txt rules
    pub fn new(robots: ParsedRobots, user_agent: &str) -> Self {
        let crawl_delay = robots
            .crawl_delay(user_agent)
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        let sitemaps = robots.sitemaps();

        Self {
            robots,
            crawl_delay,
            last_request_time: None,
            sitemaps,
        }
    }

    /// State for a host whose robots.txt could not be used
    pub fn allow_all() -> Self {
        Self {
            robots: ParsedRobots::allow_all(),
            crawl_delay: None,
            last_request_time: None,
            sitemaps: Vec::new(),
        }
    }

    /// The delay actually enforced: the larger of ours and the host's
    pub fn effective_delay(&self, configured: Duration) -> Duration {
        std::cmp::max(configured, self.crawl_delay.unwrap_or(Duration::ZERO))
    }

    /// Records that a fetch attempt to this host just finished
    pub fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }
}

impl Default for HostState {
    fn default() -> Self {
        Self::allow_all()
    }
}
