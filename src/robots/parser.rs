//! robots.txt rules
//!
//! Allow/deny matching is delegated to the robotstxt crate; the Crawl-delay
//! directive is extracted by hand because the crate does not expose it.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt rules for one host
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt content (empty means allow everything)
    content: String,
    /// Explicit allow-all marker, used when robots.txt could not be fetched
    allow_all: bool,
}

impl RobotsRules {
    /// Creates rules from raw robots.txt content
    pub fn parse(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates permissive rules that allow everything.
    ///
    /// This is the fail-open default when robots.txt cannot be fetched, so
    /// an unreachable robots endpoint never starves an otherwise-valid crawl.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks whether a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Extracts the Crawl-delay for a user agent, in seconds.
    ///
    /// A delay declared for a matching specific agent group wins over one
    /// declared for the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let normalized_agent = user_agent.to_lowercase();
        let mut group_agents: Vec<String> = Vec::new();
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;
        // A blank line or a new User-agent after directives ends the group
        let mut group_has_directives = false;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                group_agents.clear();
                group_has_directives = false;
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if group_has_directives {
                        group_agents.clear();
                        group_has_directives = false;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_has_directives = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if delay < 0.0 {
                        continue;
                    }
                    for agent in &group_agents {
                        if agent == "*" {
                            wildcard_delay = Some(delay);
                        } else if normalized_agent.contains(agent.as_str()) {
                            agent_delay = Some(delay);
                        }
                    }
                }
                _ => {
                    group_has_directives = true;
                }
            }
        }

        agent_delay.or(wildcard_delay)
    }
}
