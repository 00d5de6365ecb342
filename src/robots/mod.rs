//! robots.txt handling
//!
//! Fetching, parsing, and caching of robots.txt files. One GET to
//! `/robots.txt` is issued per newly-seen host before any other request to
//! that host; any failure along the way degrades to allow-all.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::RobotsRules;

use reqwest::Client;

/// Fetches and parses robots.txt for a host.
///
/// Fail-open by design: network errors, non-2xx statuses, and unreadable
/// bodies all yield [`RobotsRules::allow_all`]. The crawl must not starve
/// because a host mishandles its robots endpoint.
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `scheme` - Scheme of the page that triggered the fetch (http/https)
/// * `host` - Host (with optional port) to fetch robots.txt from
pub async fn fetch_robots(client: &Client, scheme: &str, host: &str) -> RobotsRules {
    let robots_url = format!("{}://{}/robots.txt", scheme, host);

    let response = match client.get(&robots_url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", host, e);
            return RobotsRules::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt for {} returned HTTP {}, allowing all",
            host,
            response.status()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => RobotsRules::parse(&body),
        Err(e) => {
            tracing::debug!("robots.txt body unreadable for {}: {}", host, e);
            RobotsRules::allow_all()
        }
    }
}
