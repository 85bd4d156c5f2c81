use url::form_urlencoded;
use url::Url;

/// Query parameters that only carry campaign or referral tracking
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "gclid",
    "fbclid",
    "igshid",
    "mc_cid",
    "mc_eid",
    "ref",
];

/// Pseudo-schemes that never lead to a fetchable page
const PSEUDO_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves `href` against `base` and returns the canonical form of the result
///
/// # Normalization Steps
///
/// 1. Reject pseudo-scheme links (`javascript:`, `mailto:`, `tel:`, `data:`)
/// 2. Resolve the reference against the base URL; an empty `href` means the
///    base URL itself
/// 3. Reject anything that is not http(s) or has no host
/// 4. Remove the fragment
/// 5. Drop tracking query parameters (case-insensitive; any `utm_*` key),
///    keeping the remaining ones in their original order, blank values included
/// 6. Scheme and host come out lowercased; path and query casing is kept
///
/// Normalization is idempotent: feeding the output back in returns it unchanged.
///
/// # Examples
///
/// ```
/// use sumi_scribe::url::normalize;
///
/// let url = normalize("https://Example.COM/docs/", "Guide?utm_source=x&b=2#top").unwrap();
/// assert_eq!(url, "https://example.com/docs/Guide?b=2");
///
/// assert!(normalize("https://example.com/", "mailto:me@example.com").is_none());
/// ```
pub fn normalize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();

    let lowered = href.to_ascii_lowercase();
    if PSEUDO_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let mut url = resolve(base.trim(), href)?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if url.host_str().map_or(true, str::is_empty) {
        return None;
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept = filter_query_params(&url);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .finish();
            url.set_query(Some(&query));
        }
    }

    Some(url.to_string())
}

/// Joins `href` onto `base`, falling back to `href` alone when the base is unusable
fn resolve(base: &str, href: &str) -> Option<Url> {
    match Url::parse(base) {
        Ok(base_url) if href.is_empty() => Some(base_url),
        Ok(base_url) => base_url.join(href).ok(),
        Err(_) if href.is_empty() => None,
        Err(_) => Url::parse(href).ok(),
    }
}

/// Removes tracking parameters while preserving the order of the rest
fn filter_query_params(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}
