//! TTL-bound caching of fetched robots.txt rules

use crate::robots::RobotsRules;
use chrono::{DateTime, Duration, Utc};

/// Cached robots.txt rules for a host, stamped with the fetch time
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed rules
    pub rules: RobotsRules,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps freshly fetched rules with the current timestamp
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Checks whether the cache entry has outlived the configured TTL
    pub fn is_stale(&self, ttl_secs: u64) -> bool {
        let age = Utc::now() - self.fetched_at;
        age > Duration::seconds(ttl_secs as i64)
    }
}
