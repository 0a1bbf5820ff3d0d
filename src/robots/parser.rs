//! Robots.txt rule evaluation
//!
//! Allow/Disallow matching is delegated to the robotstxt crate; the
//! Crawl-delay extension (which that crate ignores) is read here.

use robotstxt::DefaultMatcher;
use std::time::Duration;
use url::Url;

/// Rules of one origin's robots.txt
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Raw robots.txt body; `None` allows everything
    content: Option<String>,
}

impl RobotsRules {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// Rules used when robots.txt is missing or unreachable
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    pub fn is_allow_all(&self) -> bool {
        self.content
            .as_deref()
            .map_or(true, |c| c.trim().is_empty())
    }

    /// Checks whether `agent` may fetch `url`
    ///
    /// # Arguments
    ///
    /// * `url` - The full URL to check
    /// * `agent` - Product token of the crawler (e.g. "BTEC-FPT-Crawler")
    pub fn allows(&self, url: &Url, agent: &str) -> bool {
        match self.content.as_deref() {
            Some(body) if !body.trim().is_empty() => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, agent, url.as_str())
            }
            _ => true,
        }
    }

    /// Crawl-delay that applies to `agent`
    ///
    /// A group naming the agent wins over the `*` group. Agent names match
    /// case-insensitively as substrings of the product token.
    pub fn crawl_delay(&self, agent: &str) -> Option<Duration> {
        let body = self.content.as_deref()?;
        let agent = agent.to_lowercase();

        let mut specific = None;
        let mut wildcard = None;

        for group in parse_groups(body) {
            let Some(delay) = group.crawl_delay else {
                continue;
            };

            let names_agent = |a: &String| a != "*" && agent.contains(a.as_str());
            if group.agents.iter().any(names_agent) {
                specific = specific.or(Some(delay));
            } else if group.agents.iter().any(|a| a == "*") {
                wildcard = wildcard.or(Some(delay));
            }
        }

        specific
            .or(wildcard)
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

/// Splits robots.txt into user-agent groups
///
/// Consecutive User-agent lines share a group; the first rule line closes
/// the agent list.
fn parse_groups(body: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut collecting_agents = false;

    for line in body.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_lowercase().as_str() {
            "user-agent" => {
                if !collecting_agents {
                    groups.push(Group::default());
                    collecting_agents = true;
                }
                if let Some(group) = groups.last_mut() {
                    group.agents.push(value.to_lowercase());
                }
            }
            "crawl-delay" => {
                collecting_agents = false;
                if let (Some(group), Ok(delay)) = (groups.last_mut(), value.parse::<f64>()) {
                    group.crawl_delay.get_or_insert(delay);
                }
            }
            _ => collecting_agents = false,
        }
    }

    groups
}
