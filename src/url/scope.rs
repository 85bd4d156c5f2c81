use url::Url;

/// The set of hosts a crawl may visit
///
/// Defined by a base host (stored lowercase, without a leading `www.`) and
/// whether subdomains of it are included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    base_host: String,
    include_subdomains: bool,
}

impl CrawlScope {
    /// Creates a scope around `host`, stripping any `www.` prefix
    pub fn new(host: &str, include_subdomains: bool) -> Self {
        Self {
            base_host: base_host(host),
            include_subdomains,
        }
    }

    /// Creates a scope from a seed URL's host
    ///
    /// Returns None if the URL cannot be parsed or has no host.
    pub fn from_url(url: &str, include_subdomains: bool) -> Option<Self> {
        let url = Url::parse(url).ok()?;
        let host = url.host_str().filter(|h| !h.is_empty())?;
        Some(Self::new(host, include_subdomains))
    }

    /// The www-stripped base host
    pub fn base_host(&self) -> &str {
        &self.base_host
    }

    /// Whether subdomains of the base host are in scope
    pub fn include_subdomains(&self) -> bool {
        self.include_subdomains
    }

    /// The `www.` variant of the base host
    pub fn www_host(&self) -> String {
        format!("www.{}", self.base_host)
    }

    /// Checks whether a host is in scope
    ///
    /// A host is in scope if it equals the base host, is its `www.` variant,
    /// or (with subdomains included) ends in `.basehost`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_scribe::url::CrawlScope;
    ///
    /// let scope = CrawlScope::new("www.example.com", false);
    /// assert!(scope.allows_host("example.com"));
    /// assert!(scope.allows_host("WWW.example.com"));
    /// assert!(!scope.allows_host("blog.example.com"));
    ///
    /// let scope = CrawlScope::new("example.com", true);
    /// assert!(scope.allows_host("api.v2.example.com"));
    /// assert!(!scope.allows_host("notexample.com"));
    /// ```
    pub fn allows_host(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        let host = host.to_lowercase();
        if host == self.base_host {
            return true;
        }

        if self.include_subdomains {
            host.ends_with(&format!(".{}", self.base_host))
        } else {
            host == self.www_host()
        }
    }
}

/// Lowercases a host and strips a leading `www.`
pub fn base_host(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Checks whether a URL's host is inside the crawl scope
///
/// Malformed URLs and URLs without a host are never in scope.
pub fn is_in_scope(url: &str, scope: &CrawlScope) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| scope.allows_host(h)))
        .unwrap_or(false)
}
