//! HTML parsing for outbound links and the page title
//!
//! Hrefs are returned exactly as written in the document. Resolution,
//! canonicalization and scope filtering happen in [`crate::url`], so the
//! same rules apply to links, seeds and sitemap entries.

use scraper::{Html, Selector};

/// Extracts the raw `href` of every `<a>` element, in document order
///
/// Parsing is lenient: malformed markup yields whatever could be recovered,
/// never an error. Empty and fragment-only hrefs are dropped.
///
/// # Example
///
/// ```
/// use sumi_scribe::crawler::extract_links;
///
/// let html = r##"<html><body><a href="/page">Link</a><a href="#top">Top</a></body></html>"##;
/// assert_eq!(extract_links(html), vec!["/page".to_string()]);
/// ```
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim())
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Extracts the page title from a parsed document
pub(crate) fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|s| !s.is_empty())
}
