use crate::UrlError;
use url::Url;

/// Query parameters removed when no explicit list is configured
pub const DEFAULT_TRACKING_PARAMS: &[&str] = &[
    "sessionid",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "fbclid",
    "gclid",
];

/// Normalizes a URL using the default tracking-parameter list
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http and https
/// 3. Lowercase the scheme and host
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking and session query parameters
/// 7. Sort remaining query parameters by key
/// 8. Remove empty query string (trailing ?)
///
/// # Examples
///
/// ```
/// use campus_archiver::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/page/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    normalize_with(url_str, |key| {
        DEFAULT_TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
    })
}

/// Normalizes a URL, removing the given tracking parameters
pub fn normalize_url_with(url_str: &str, tracking_params: &[String]) -> Result<Url, UrlError> {
    normalize_with(url_str, |key| {
        key.starts_with("utm_") || tracking_params.iter().any(|p| p.eq_ignore_ascii_case(key))
    })
}

/// Returns the canonical deduplication key for a URL, or None if it is malformed
pub fn canonical_key(url_str: &str, tracking_params: &[String]) -> Option<String> {
    normalize_url_with(url_str, tracking_params)
        .ok()
        .map(String::from)
}

fn normalize_with<F>(url_str: &str, is_tracking: F) -> Result<Url, UrlError>
where
    F: Fn(&str) -> bool,
{
    // The parser already lowercases the scheme and ASCII hosts
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .map(str::to_lowercase)
        .ok_or(UrlError::MissingDomain)?;
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}
