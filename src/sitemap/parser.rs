//! Sitemap XML parsing
//!
//! Element names are matched on their local part, so `<urlset>`,
//! `<sm:urlset>` and a default-namespaced `<urlset xmlns="...">` all parse the
//! same way.

use quick_xml::events::Event;
use quick_xml::Reader;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<urlset>`: page URLs, in document order
    UrlSet(Vec<String>),

    /// `<sitemapindex>`: child sitemap URLs, in document order
    Index(Vec<String>),
}

impl SitemapDocument {
    /// The `<loc>` values of the document
    pub fn locations(&self) -> &[String] {
        match self {
            Self::UrlSet(locs) | Self::Index(locs) => locs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    UrlSet,
    Index,
}

/// Parses sitemap XML
///
/// Returns None for malformed XML or a root element that is neither
/// `urlset` nor `sitemapindex`.
///
/// ```
/// use sumi_scribe::sitemap::{parse_sitemap, SitemapDocument};
///
/// let xml = br#"<?xml version="1.0"?>
/// <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/a</loc></url>
/// </urlset>"#;
/// assert_eq!(
///     parse_sitemap(xml),
///     Some(SitemapDocument::UrlSet(vec!["https://example.com/a".to_string()]))
/// );
/// ```
pub fn parse_sitemap(xml: &[u8]) -> Option<SitemapDocument> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut root: Option<Root> = None;
    let mut in_loc = false;
    let mut current = String::new();
    let mut locs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if root.is_none() {
                    root = Some(match name.as_ref() {
                        b"urlset" => Root::UrlSet,
                        b"sitemapindex" => Root::Index,
                        _ => return None,
                    });
                } else if name.as_ref() == b"loc" {
                    in_loc = true;
                    current.clear();
                }
            }
            Ok(Event::Empty(e)) if root.is_none() => {
                // A self-closing root is a valid, empty document
                return match e.local_name().as_ref() {
                    b"urlset" => Some(SitemapDocument::UrlSet(Vec::new())),
                    b"sitemapindex" => Some(SitemapDocument::Index(Vec::new())),
                    _ => None,
                };
            }
            Ok(Event::Text(t)) if in_loc => {
                current.push_str(&t.unescape().ok()?);
            }
            Ok(Event::CData(c)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(e)) => {
                if in_loc && e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                    let loc = current.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    "Sitemap XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                return None;
            }
            _ => {}
        }
        buf.clear();
    }

    match root? {
        Root::UrlSet => Some(SitemapDocument::UrlSet(locs)),
        Root::Index => Some(SitemapDocument::Index(locs)),
    }
}
