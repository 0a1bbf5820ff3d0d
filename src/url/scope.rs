//! Crawl-scope decisions for discovered URLs

use crate::config::ScopeConfig;
use url::Url;

/// Checks if a host matches a domain pattern
///
/// Two kinds of patterns are supported:
/// 1. Exact: "example.com" matches only "example.com"
/// 2. Wildcard: "*.example.com" matches "example.com" and any subdomain of it
///
/// # Examples
///
/// ```
/// use campus_archiver::url::matches_domain;
///
/// assert!(matches_domain("example.com", "example.com"));
/// assert!(!matches_domain("example.com", "blog.example.com"));
/// assert!(matches_domain("*.example.com", "blog.example.com"));
/// assert!(!matches_domain("*.example.com", "myexample.com"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => host == pattern,
    }
}

/// Decides whether a URL belongs to the crawl
///
/// A URL is in scope when its host matches one of the configured domain
/// patterns, its path does not end in a non-content extension, and its path
/// does not contain an authentication marker. Malformed URLs are never valid.
#[derive(Debug, Clone)]
pub struct ScopeValidator {
    domains: Vec<String>,
    skip_extensions: Vec<String>,
    skip_patterns: Vec<String>,
}

impl ScopeValidator {
    pub fn new(config: &ScopeConfig) -> Self {
        let lower = |list: &[String]| list.iter().map(|s| s.to_lowercase()).collect();

        Self {
            domains: lower(&config.in_scope_domains),
            skip_extensions: lower(&config.skip_extensions),
            skip_patterns: lower(&config.skip_patterns),
        }
    }

    /// Returns true if the raw URL string is a valid, in-scope crawl target
    pub fn is_valid(&self, url: &str) -> bool {
        Url::parse(url.trim())
            .map(|parsed| self.is_valid_url(&parsed))
            .unwrap_or(false)
    }

    /// Returns true if the parsed URL is a valid, in-scope crawl target
    pub fn is_valid_url(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        if !self.is_in_scope(url) {
            return false;
        }

        let path = url.path().to_lowercase();

        if self.skip_extensions.iter().any(|ext| path.ends_with(ext)) {
            return false;
        }

        !self.skip_patterns.iter().any(|p| path.contains(p))
    }

    /// Returns true if the URL's host matches an in-scope domain pattern
    pub fn is_in_scope(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                let host = host.to_lowercase();
                self.domains
                    .iter()
                    .any(|pattern| matches_domain(pattern, &host))
            }
            None => false,
        }
    }
}
