//! Sitemap-driven seeding
//!
//! Resolves sitemaps and sitemap indexes into an ordered list of page URL
//! candidates. Indexes are walked depth-first with an explicit worklist and a
//! seen set, so self-referencing or mutually-referencing indexes terminate.
//! Every failure is local to one sitemap: it contributes nothing and its
//! siblings are still resolved.

mod parser;

pub use parser::{parse_sitemap, SitemapDocument};

use crate::crawler::{FetchResult, Fetcher};
use flate2::read::GzDecoder;
use std::collections::HashSet;
use std::io::Read;

/// First two bytes of every gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Resolves sitemap URLs into page URL candidates
///
/// Candidates are returned in discovery order and still need to pass the URL
/// normalizer and scope filter.
///
/// # Arguments
///
/// * `fetcher` - The HTTP fetcher
/// * `sitemap_urls` - Root sitemaps or sitemap indexes
/// * `max_urls` - Stop once this many candidates are collected (across all roots)
pub async fn seed_from(
    fetcher: &Fetcher,
    sitemap_urls: &[String],
    max_urls: Option<usize>,
) -> Vec<String> {
    let limit_reached = |count: usize| max_urls.is_some_and(|max| count >= max);

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates: Vec<String> = Vec::new();
    // Popped from the back; pushing children reversed keeps document order
    let mut worklist: Vec<String> = sitemap_urls.iter().rev().cloned().collect();

    while let Some(sitemap_url) = worklist.pop() {
        if limit_reached(candidates.len()) {
            tracing::debug!("Sitemap URL limit reached, {} sitemaps left", worklist.len());
            break;
        }
        if !seen.insert(sitemap_url.clone()) {
            tracing::trace!("Already resolved sitemap {}", sitemap_url);
            continue;
        }

        match fetch_sitemap(fetcher, &sitemap_url).await {
            Some(SitemapDocument::UrlSet(locs)) => {
                tracing::debug!("Sitemap {} lists {} URLs", sitemap_url, locs.len());
                for loc in locs {
                    if limit_reached(candidates.len()) {
                        break;
                    }
                    candidates.push(loc);
                }
            }
            Some(SitemapDocument::Index(children)) => {
                tracing::debug!(
                    "Sitemap index {} lists {} sitemaps",
                    sitemap_url,
                    children.len()
                );
                worklist.extend(
                    children
                        .into_iter()
                        .rev()
                        .filter(|child| !seen.contains(child)),
                );
            }
            None => {}
        }
    }

    tracing::info!(
        "Resolved {} sitemaps into {} candidate URLs",
        seen.len(),
        candidates.len()
    );
    candidates
}

/// Fetches, decompresses and parses one sitemap
///
/// Returns None (after logging) on any failure.
pub async fn fetch_sitemap(fetcher: &Fetcher, sitemap_url: &str) -> Option<SitemapDocument> {
    let response = match fetcher.fetch(sitemap_url).await {
        FetchResult::Response(response) if response.is_success() => response,
        FetchResult::Response(response) => {
            tracing::warn!(
                "Sitemap {} returned HTTP {}",
                sitemap_url,
                response.status_code
            );
            return None;
        }
        FetchResult::Failed { error } => {
            tracing::warn!("Could not fetch sitemap {}: {}", sitemap_url, error);
            return None;
        }
    };

    let body = if response.body.starts_with(&GZIP_MAGIC) {
        match gunzip(&response.body) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Could not decompress sitemap {}: {}", sitemap_url, e);
                return None;
            }
        }
    } else {
        // .gz sitemaps served with Content-Encoding arrive already decoded
        response.body
    };

    let document = parse_sitemap(&body);
    if document.is_none() {
        tracing::warn!("Could not parse sitemap {}", sitemap_url);
    }
    document
}

fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
