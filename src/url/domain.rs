use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scribe::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Returns the key used to track per-host politeness state
///
/// This is the host plus any non-default port, so two servers on the same
/// machine are throttled independently.
///
/// ```
/// use url::Url;
/// use sumi_scribe::url::host_key;
///
/// let url = Url::parse("http://127.0.0.1:4000/a").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:4000".to_string()));
///
/// let url = Url::parse("https://example.com:443/a").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = extract_host(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Builds the robots.txt URL for the origin of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    extract_host(url)?;
    url.join("/robots.txt").ok()
}
