//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of the
//! crawling process:
//! - Opening storage and replaying prior outcomes on resume
//! - Seeding the frontier from explicit seeds and sitemaps
//! - Gating every fetch through robots rules and per-host throttling
//! - Extracting, storing and recording each page
//! - Enforcing the byte and page budgets
//! - Writing the final run summary

use crate::config::{Config, CrawlerConfig};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::extract_links;
use crate::crawler::politeness::Politeness;
use crate::crawler::{FetchResult, FetchedResponse, Fetcher};
use crate::extract::{Extractor, MarkdownExtractor};
use crate::output::{CrawlStats, OutcomeCounts};
use crate::sitemap;
use crate::state::RunBudget;
use crate::storage::{open_storage, timestamp_now, OutcomeRecord, Storage};
use crate::url::{is_crawlable, is_in_scope, normalize, CrawlScope};
use crate::{Result, ScribeError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use url::{Host, Url};

/// Pages between progress log lines
const PROGRESS_INTERVAL: u64 = 50;

/// Why a run ended; every reason is a normal completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The frontier ran dry
    QueueExhausted,

    /// `max_pages` pages were written
    PageLimit,

    /// The byte budget is full, or the next page would overflow it
    ByteBudget,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueueExhausted => "queue_exhausted",
            Self::PageLimit => "page_limit",
            Self::ByteBudget => "byte_budget",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one frontier entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The loop may dequeue another URL
    Continue,

    /// The run is over
    Stop(StopReason),
}

/// Main crawler coordinator structure
///
/// Owns all per-run state: frontier, visited set, budget, politeness cache
/// and storage handle. Nothing is global, so independent coordinators can
/// run in the same process.
pub struct Coordinator {
    config: CrawlerConfig,
    scope: CrawlScope,
    seeds: Vec<String>,
    fetcher: Fetcher,
    politeness: Politeness,
    extractor: Box<dyn Extractor>,
    storage: Box<dyn Storage + Send>,
    frontier: Frontier,
    visited: HashSet<String>,
    budget: RunBudget,
    outcomes: OutcomeCounts,
    started_at: String,
    seeded: bool,
}

impl Coordinator {
    /// Creates a coordinator writing to the configured output directory
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to seed and run
    /// * `Err(ScribeError)` - Invalid seed, unusable output directory or HTTP client failure
    pub fn new(config: Config) -> Result<Self> {
        let storage = open_storage(&config.output.directory)?;
        tracing::info!("Writing to {}", config.output.directory.display());
        Self::with_storage(config.crawler, Box::new(storage))
    }

    /// Creates a coordinator on top of an already opened storage backend
    pub fn with_storage(config: CrawlerConfig, storage: Box<dyn Storage + Send>) -> Result<Self> {
        let seeds = prepare_seeds(&config.start_urls)?;
        let scope = seeds
            .first()
            .and_then(|seed| CrawlScope::from_url(seed, config.include_subdomains))
            .ok_or_else(|| ScribeError::InvalidSeed(config.start_urls.join(", ")))?;

        let mut budget = RunBudget::new(config.max_bytes, config.max_pages);
        let mut visited = HashSet::new();
        if config.resume {
            let prior = storage.load_prior_state()?;
            tracing::info!(
                "Resuming: {} URLs already visited, {} bytes already written",
                prior.visited.len(),
                prior.bytes_written
            );
            if prior.skipped_lines > 0 {
                tracing::warn!("Ignored {} malformed lines in meta.jsonl", prior.skipped_lines);
            }
            visited = prior.visited;
            budget = budget.with_prior_bytes(prior.bytes_written);
        }

        let fetcher = Fetcher::new(&config.user_agent, config.timeout())?;
        let politeness = Politeness::new(fetcher.clone(), &config.user_agent, config.delay());

        tracing::info!(
            "Crawl scope: {} (subdomains {})",
            scope.base_host(),
            if scope.include_subdomains() {
                "included"
            } else {
                "excluded"
            }
        );

        Ok(Self {
            config,
            scope,
            seeds,
            fetcher,
            politeness,
            extractor: Box::new(MarkdownExtractor::new()),
            storage,
            frontier: Frontier::new(),
            visited,
            budget,
            outcomes: OutcomeCounts::default(),
            started_at: timestamp_now(),
            seeded: false,
        })
    }

    /// Replaces the document extractor
    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Fills the frontier: explicit seeds first, then sitemap candidates
    ///
    /// Runs once; later calls do nothing.
    pub async fn seed(&mut self) {
        if self.seeded {
            return;
        }
        self.seeded = true;

        for seed in self.seeds.clone() {
            self.frontier.push(seed);
        }

        if !self.config.use_sitemaps {
            tracing::debug!("Sitemap seeding disabled");
            return;
        }

        let sitemap_urls = self.discover_sitemaps().await;
        if sitemap_urls.is_empty() {
            tracing::debug!("No sitemaps to seed from");
            return;
        }

        let candidates =
            sitemap::seed_from(&self.fetcher, &sitemap_urls, self.config.max_sitemap_urls).await;
        let before = self.frontier.len();
        for candidate in candidates {
            let Some(url) = normalize(&candidate, "") else {
                continue;
            };
            if is_crawlable(&url, &self.scope) && !self.visited.contains(&url) {
                self.frontier.push(url);
            }
        }
        tracing::info!(
            "Seeded {} URLs from {} sitemaps",
            self.frontier.len() - before,
            sitemap_urls.len()
        );
    }

    /// Collects sitemap URLs from robots.txt of the seed host and its `www.` variant
    async fn discover_sitemaps(&mut self) -> Vec<String> {
        let mut found: BTreeSet<String> = self.config.sitemaps.iter().cloned().collect();

        let Some(seed_url) = self.seeds.first().and_then(|s| Url::parse(s).ok()) else {
            return found.into_iter().collect();
        };

        if let Some(state) = self.politeness.policy_for(&seed_url).await {
            found.extend(state.sitemaps.iter().cloned());
        }

        let www_host = self.scope.www_host();
        let seed_is_domain = matches!(seed_url.host(), Some(Host::Domain(_)));
        if seed_is_domain
            && seed_url.host_str() != Some(www_host.as_str())
            && self.scope.allows_host(&www_host)
        {
            let mut www_url = seed_url.clone();
            if www_url.set_host(Some(&www_host)).is_ok() {
                if let Some(state) = self.politeness.policy_for(&www_url).await {
                    found.extend(state.sitemaps.iter().cloned());
                }
            }
        }

        found.into_iter().collect()
    }

    /// Runs the crawl to completion and writes `stats.json`
    pub async fn run(&mut self) -> Result<CrawlStats> {
        self.seed().await;
        tracing::info!("Starting crawl with {} URLs queued", self.frontier.len());

        let reason = loop {
            match self.step().await? {
                StepOutcome::Continue => {}
                StepOutcome::Stop(reason) => break reason,
            }
        };

        let stats = self.stats(reason);
        self.storage.write_final_stats(&stats)?;

        tracing::info!(
            "Done ({}). Pages: {} | Bytes: {} | Queue: {}",
            reason,
            stats.pages_written,
            stats.total_markdown_bytes,
            stats.queue_remaining
        );
        Ok(stats)
    }

    /// Processes the next frontier entry
    ///
    /// Budgets are checked before dequeuing. Only storage failures are
    /// returned as errors; every per-URL problem becomes a recorded outcome.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        if self.budget.pages_exhausted() {
            return Ok(StepOutcome::Stop(StopReason::PageLimit));
        }
        if self.budget.bytes_exhausted() {
            return Ok(StepOutcome::Stop(StopReason::ByteBudget));
        }

        let Some(url) = self.frontier.pop() else {
            return Ok(StepOutcome::Stop(StopReason::QueueExhausted));
        };

        self.process(url).await
    }

    async fn process(&mut self, url: String) -> Result<StepOutcome> {
        if self.visited.contains(&url) || !is_crawlable(&url, &self.scope) {
            tracing::trace!("Discarding {}", url);
            return Ok(StepOutcome::Continue);
        }
        let Ok(parsed) = Url::parse(&url) else {
            return Ok(StepOutcome::Continue);
        };

        if !self.politeness.can_fetch(&parsed).await {
            tracing::debug!("Blocked by robots.txt: {}", url);
            self.record(OutcomeRecord::blocked_by_robots(&url))?;
            return Ok(StepOutcome::Continue);
        }

        self.politeness.throttle(&parsed).await;
        let result = self.fetcher.fetch(&url).await;
        self.politeness.record_attempt(&parsed);

        let response = match result {
            FetchResult::Response(response) => response,
            FetchResult::Failed { error } => {
                tracing::debug!("Request failed for {}: {}", url, error);
                self.record(OutcomeRecord::request_failed(&url))?;
                return Ok(StepOutcome::Continue);
            }
        };

        if !is_in_scope(&response.final_url, &self.scope) {
            tracing::debug!("{} redirected off domain to {}", url, response.final_url);
            let record = OutcomeRecord::redirected_off_domain(
                &url,
                &response.final_url,
                response.status_code,
            );
            self.record(record)?;
            return Ok(StepOutcome::Continue);
        }

        let final_url =
            normalize(&response.final_url, "").unwrap_or_else(|| response.final_url.clone());
        if final_url != url && self.visited.contains(&final_url) {
            tracing::debug!("{} redirected to already visited {}", url, final_url);
            let record =
                OutcomeRecord::redirected_to_visited(&url, &final_url, response.status_code);
            self.record(record)?;
            return Ok(StepOutcome::Continue);
        }

        if !response.is_html() {
            tracing::debug!(
                "Skipping non-HTML {} ({})",
                final_url,
                response.content_type
            );
            let record = OutcomeRecord::non_html(
                &final_url,
                response.status_code,
                &response.content_type,
            )
            .with_requested_url(&url);
            self.record(record)?;
            return Ok(StepOutcome::Continue);
        }

        self.store_page(&url, &final_url, &response)
    }

    /// Extracts, stores and records an HTML page, then enqueues its links
    fn store_page(
        &mut self,
        url: &str,
        final_url: &str,
        response: &FetchedResponse,
    ) -> Result<StepOutcome> {
        let html = response.text();
        let fetched_at = timestamp_now();
        let document = self.extractor.extract(&html, final_url, &fetched_at);
        let size = document.len() as u64;

        if self.budget.would_overflow(size) {
            tracing::info!(
                "Next page ({} bytes) would exceed the byte budget ({} of {} used), stopping",
                size,
                self.budget.bytes_written,
                self.budget.max_bytes
            );
            return Ok(StepOutcome::Stop(StopReason::ByteBudget));
        }

        let markdown_path = self.storage.store_document(final_url, &document)?;
        let total_bytes = self.budget.commit(size);
        let record = OutcomeRecord::ok(
            final_url,
            response.status_code,
            &response.content_type,
            &markdown_path,
            size,
            total_bytes,
            &fetched_at,
        )
        .with_requested_url(url);
        self.record(record)?;

        if self.budget.pages_written % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Pages written: {} | Queue: {} | Total bytes: {}",
                self.budget.pages_written,
                self.frontier.len(),
                self.budget.bytes_written
            );
        }

        self.enqueue_links(final_url, &html);
        Ok(StepOutcome::Continue)
    }

    fn enqueue_links(&mut self, base: &str, html: &str) {
        let mut added = 0;
        for href in extract_links(html) {
            let Some(link) = normalize(base, &href) else {
                continue;
            };
            if !is_crawlable(&link, &self.scope) || self.visited.contains(&link) {
                continue;
            }
            if self.frontier.push(link) {
                added += 1;
            }
        }
        tracing::debug!("Queued {} new links from {}", added, base);
    }

    /// Appends a record and marks its URLs visited
    ///
    /// The visited set only grows through here, so replaying `meta.jsonl`
    /// rebuilds it exactly.
    fn record(&mut self, record: OutcomeRecord) -> Result<()> {
        self.storage.append_record(&record)?;
        self.outcomes.tally(record.status);
        self.visited.extend(record.visited_urls().map(str::to_string));
        Ok(())
    }

    /// Builds the summary for a run that stopped for `reason`
    pub fn stats(&self, reason: StopReason) -> CrawlStats {
        CrawlStats {
            pages_written: self.budget.pages_written,
            total_markdown_bytes: self.budget.bytes_written,
            outcomes: self.outcomes,
            queue_remaining: self.frontier.len() as u64,
            base_host: self.scope.base_host().to_string(),
            include_subdomains: self.scope.include_subdomains(),
            max_bytes: self.budget.max_bytes,
            max_pages: self.budget.max_pages,
            stop_reason: reason,
            started_at: self.started_at.clone(),
            ended_at: timestamp_now(),
        }
    }

    /// URLs waiting to be fetched
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// URLs with a terminal outcome
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn budget(&self) -> &RunBudget {
        &self.budget
    }

    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    /// Non-ok outcome counts for this run
    pub fn outcomes(&self) -> &OutcomeCounts {
        &self.outcomes
    }
}

/// Canonicalizes seed URLs, keeping the raw string when normalization fails
///
/// The first seed defines the crawl scope, so it must have a host.
pub fn prepare_seeds(start_urls: &[String]) -> Result<Vec<String>> {
    let seeds: Vec<String> = start_urls
        .iter()
        .map(|raw| normalize(raw, "").unwrap_or_else(|| raw.trim().to_string()))
        .filter(|seed| !seed.is_empty())
        .collect();

    match seeds.first() {
        Some(first) if CrawlScope::from_url(first, false).is_some() => Ok(seeds),
        Some(first) => Err(ScribeError::InvalidSeed(first.clone())),
        None => Err(ScribeError::InvalidSeed("no start URLs".to_string())),
    }
}

/// Runs the main crawl operation
///
/// # Example
///
/// ```no_run
/// use sumi_scribe::config::load_config;
/// use sumi_scribe::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let stats = run_crawl(config).await?;
/// println!("{} pages", stats.pages_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlStats> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
