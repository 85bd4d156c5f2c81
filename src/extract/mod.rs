//! HTML to document conversion
//!
//! The crawl engine treats extraction as an opaque, infallible function. The
//! default [`MarkdownExtractor`] produces Markdown with a small YAML front
//! matter block naming the source URL and fetch time.

use crate::crawler::extract_title;
use scraper::{Html, Node, Selector, StrTendril};
use url::Url;

/// Converts a fetched HTML page into the stored document
pub trait Extractor: Send + Sync {
    /// Builds the document for `html` fetched from `url` at `fetched_at`
    ///
    /// Must not fail: unusable input degrades to the raw HTML.
    fn extract(&self, html: &str, url: &str, fetched_at: &str) -> String;
}

/// Elements dropped before conversion
const DROPPED_ELEMENTS: &str = "script, style, noscript";

/// Elements carrying links rewritten to absolute URLs
const LINKED_ELEMENTS: &str = "[href], [src]";

/// Attributes rewritten to absolute URLs
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// HTML to Markdown via `html2md`
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for MarkdownExtractor {
    fn extract(&self, html: &str, url: &str, fetched_at: &str) -> String {
        let document = Html::parse_document(html);
        let title = extract_title(&document);
        let base = Url::parse(url).ok();

        let cleaned = clean_body(document, base.as_ref());
        let converted = std::panic::catch_unwind(|| html2md::parse_html(&cleaned))
            .map(|markdown| collapse_blank_lines(&markdown))
            .unwrap_or_else(|_| {
                tracing::warn!("Markdown conversion failed for {}, keeping raw HTML", url);
                html.trim().to_string()
            });

        let body = match title {
            Some(title) if !starts_with_heading(&converted) => {
                if converted.is_empty() {
                    format!("# {}", title)
                } else {
                    format!("# {}\n\n{}", title, converted)
                }
            }
            Some(_) => converted,
            None if converted.is_empty() => html.trim().to_string(),
            None => converted,
        };

        format!(
            "---\nsource: {}\nfetched_at: {}\n---\n{}\n",
            url, fetched_at, body
        )
    }
}

/// Serializes the page body without scripts, styles and relative links
fn clean_body(mut document: Html, base: Option<&Url>) -> String {
    let (dropped, linked) = match (
        Selector::parse(DROPPED_ELEMENTS),
        Selector::parse(LINKED_ELEMENTS),
    ) {
        (Ok(dropped), Ok(linked)) => (
            document.select(&dropped).map(|e| e.id()).collect::<Vec<_>>(),
            document.select(&linked).map(|e| e.id()).collect::<Vec<_>>(),
        ),
        _ => (Vec::new(), Vec::new()),
    };

    for id in dropped {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    if let Some(base) = base {
        for id in linked {
            let Some(mut node) = document.tree.get_mut(id) else {
                continue;
            };
            if let Node::Element(element) = node.value() {
                for (name, value) in element.attrs.iter_mut() {
                    if URL_ATTRIBUTES.contains(&&*name.local) {
                        *value = StrTendril::from(absolutize(value, base));
                    }
                }
            }
        }
    }

    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .map(|body| body.inner_html())
        .unwrap_or_else(|| document.root_element().inner_html())
}

/// Resolves a link attribute, leaving pseudo-scheme and unparseable values alone
fn absolutize(value: &str, base: &Url) -> String {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();
    if trimmed.is_empty()
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
    {
        return value.to_string();
    }

    base.join(trimmed)
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// True for a leading ATX (`# x`) or setext (`x` over `===`) heading
fn starts_with_heading(markdown: &str) -> bool {
    if markdown.trim_start().starts_with('#') {
        return true;
    }
    let mut lines = markdown.lines();
    match (lines.next(), lines.next()) {
        (Some(text), Some(rule)) => {
            let rule = rule.trim();
            !text.trim().is_empty()
                && !rule.is_empty()
                && (rule.chars().all(|c| c == '=') || rule.chars().all(|c| c == '-'))
        }
        _ => false,
    }
}

/// Trims the document and squeezes runs of 3+ newlines down to one blank line
fn collapse_blank_lines(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut newlines = 0;

    for c in markdown.trim().chars() {
        if c == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(c);
    }
    out
}
