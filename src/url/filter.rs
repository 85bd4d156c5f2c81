use url::Url;

/// Path extensions of binary and asset resources that are never crawled
const SKIP_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".pdf", ".zip", ".tar", ".gz",
    ".mp4", ".mov", ".mp3", ".wav", ".avi", ".mkv", ".webm", ".css", ".js", ".json", ".xml",
    ".rss",
];

/// Checks whether a URL points at a binary or asset resource
///
/// The check looks only at the path (case-insensitive), so query strings do
/// not hide an extension and do not create one. Malformed URLs return false;
/// they are rejected by normalization instead.
///
/// ```
/// use sumi_scribe::url::is_skippable;
///
/// assert!(is_skippable("https://example.com/logo.PNG"));
/// assert!(is_skippable("https://example.com/feed.rss?page=2"));
/// assert!(!is_skippable("https://example.com/article?file=a.png"));
/// ```
pub fn is_skippable(url: &str) -> bool {
    let Ok(url) = Url::parse(url) else {
        return false;
    };

    let path = url.path().to_lowercase();
    SKIP_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
