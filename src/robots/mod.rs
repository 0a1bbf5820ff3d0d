//! Robots.txt handling module
//!
//! This module fetches robots.txt once per origin through the crawler's
//! fetcher, caches the parsed rules for the rest of the run, and answers
//! allow/deny and crawl-delay questions.

mod parser;

pub use parser::RobotsRules;

use crate::crawler::Fetcher;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

type RulesCell = Arc<OnceCell<Arc<RobotsRules>>>;

/// Per-run robots.txt policy
///
/// When disabled, every URL is allowed and no robots.txt is fetched.
#[derive(Debug)]
pub struct RobotsPolicy {
    enabled: bool,
    agent: String,
    cache: Mutex<HashMap<String, RulesCell>>,
}

impl RobotsPolicy {
    /// # Arguments
    ///
    /// * `user_agent` - Full User-Agent header; only its product token is matched
    /// * `enabled` - Whether robots.txt is honored at all
    pub fn new(user_agent: &str, enabled: bool) -> Self {
        Self {
            enabled,
            agent: product_token(user_agent).to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether the crawler may fetch `url`
    pub async fn is_allowed(&self, fetcher: &Fetcher, url: &Url) -> bool {
        if !self.enabled {
            return true;
        }

        self.rules_for(fetcher, url).await.allows(url, &self.agent)
    }

    /// Crawl-delay requested by the origin of `url`
    pub async fn crawl_delay(&self, fetcher: &Fetcher, url: &Url) -> Option<Duration> {
        if !self.enabled {
            return None;
        }

        self.rules_for(fetcher, url).await.crawl_delay(&self.agent)
    }

    /// Returns the cached rules for the URL's origin, fetching them on first use
    ///
    /// Each origin has its own cell: racing pipelines for one origin share a
    /// single robots.txt request, while other origins are never held up by it.
    async fn rules_for(&self, fetcher: &Fetcher, url: &Url) -> Arc<RobotsRules> {
        let cell = self.cell_for(url.origin().ascii_serialization());

        let rules = cell
            .get_or_init(|| async { Arc::new(fetch_rules(fetcher, url).await) })
            .await;
        Arc::clone(rules)
    }

    fn cell_for(&self, origin: String) -> RulesCell {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(cache.entry(origin).or_default())
    }
}

/// Location of the robots.txt governing `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

/// First token of a User-Agent string ("Name/1.0 (...)" gives "Name")
pub fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or(user_agent)
}

/// Fetches and parses robots.txt; anything but a 200 means allow-all
async fn fetch_rules(fetcher: &Fetcher, url: &Url) -> RobotsRules {
    let Some(robots) = robots_url(url) else {
        return RobotsRules::allow_all();
    };

    match fetcher.fetch(&robots).await {
        Ok(resource) if resource.status == 200 => {
            let rules = RobotsRules::from_content(&resource.text());
            if rules.is_allow_all() {
                tracing::debug!("{} has no rules, allowing all", robots);
            } else {
                tracing::debug!("Loaded {}", robots);
            }
            rules
        }
        Ok(resource) => {
            tracing::debug!("No robots.txt at {} (HTTP {})", robots, resource.status);
            RobotsRules::allow_all()
        }
        Err(e) => {
            tracing::warn!("Could not fetch {}: {}; allowing all", robots, e);
            RobotsRules::allow_all()
        }
    }
}
