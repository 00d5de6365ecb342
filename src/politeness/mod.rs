//! Politeness gate
//!
//! Per-host fetch spacing and robots-exclusion enforcement. Workers call
//! [`PolitenessGate::check_allowed`] before [`PolitenessGate::acquire`]; the
//! first contact with a host fetches and caches its robots.txt, so the
//! robots GET is always that host's first request.

use crate::config::PolitenessConfig;
use crate::robots::{fetch_robots, CachedRobots};
use crate::state::HostState;
use crate::url::host_key;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

/// Per-host rate limiter and robots.txt enforcer
pub struct PolitenessGate {
    hosts: Mutex<HashMap<String, HostState>>,
    client: Client,
    config: PolitenessConfig,
    user_agent: String,
}

impl PolitenessGate {
    pub fn new(client: Client, config: PolitenessConfig, user_agent: String) -> Self {
        Self {
            hosts: Mutex::new(HashMap::new()),
            client,
            config,
            user_agent,
        }
    }

    /// Checks whether a URL may be fetched under its host's robots rules.
    ///
    /// Fetches and caches robots.txt on first contact with the host or when
    /// the cached copy has outlived its TTL. A robots Crawl-delay directive
    /// raises the host's effective spacing at this point. Robots fetch
    /// failures fail open.
    pub async fn check_allowed(&self, url: &Url) -> bool {
        let host = host_key(url);

        let needs_fetch = {
            let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
            match hosts.get(&host).and_then(|s| s.robots.as_ref()) {
                Some(cached) => cached.is_stale(self.config.robots_ttl_secs),
                None => true,
            }
        };

        if needs_fetch {
            tracing::debug!("Fetching robots.txt for {}", host);
            let rules = fetch_robots(&self.client, url.scheme(), &host).await;
            let robots_delay = rules.crawl_delay(&self.user_agent);

            // Two workers may race the first fetch for one host; either
            // result is acceptable and last-write wins.
            let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
            let state = hosts
                .entry(host.clone())
                .or_insert_with(|| HostState::new(self.config.min_delay()));
            state.robots = Some(CachedRobots::new(rules));
            if let Some(delay) = robots_delay {
                state.apply_robots_delay(
                    delay,
                    self.config.min_delay(),
                    Duration::from_secs(self.config.max_robots_delay_secs),
                );
                tracing::debug!(
                    "Host {} crawl delay set to {:?} from robots.txt",
                    host,
                    state.crawl_delay
                );
            }
        }

        let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        match hosts.get(&host).and_then(|s| s.robots.as_ref()) {
            Some(cached) => cached.rules.is_allowed(url.as_str(), &self.user_agent),
            None => true,
        }
    }

    /// Waits until a fetch to `host` is permitted, then reserves the slot.
    ///
    /// The readiness check and the `last_fetch` update happen under one
    /// lock, so two workers can never pass the gate for the same host
    /// simultaneously: the loser observes the winner's reservation and
    /// sleeps out the remaining delay.
    pub async fn acquire(&self, host: &str) {
        loop {
            let wait = {
                let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
                let state = hosts
                    .entry(host.to_string())
                    .or_insert_with(|| HostState::new(self.config.min_delay()));
                match state.ready_in(Instant::now()) {
                    None => {
                        state.record_fetch(Instant::now());
                        return;
                    }
                    Some(wait) => wait,
                }
            };

            tracing::trace!("Politeness wait {:?} for host {}", wait, host);
            tokio::time::sleep(wait).await;
        }
    }

    /// Effective crawl delay currently in force for a host
    pub fn delay_for(&self, host: &str) -> Duration {
        let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        hosts
            .get(host)
            .map(|s| s.crawl_delay)
            .unwrap_or_else(|| self.config.min_delay())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_gate(min_delay_ms: u64) -> PolitenessGate {
        let config = PolitenessConfig {
            min_delay_ms,
            robots_ttl_secs: 3600,
            max_robots_delay_secs: 60,
        };
        PolitenessGate::new(Client::new(), config, "TestBot/1.0".to_string())
    }

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let gate = test_gate(1000);
        let start = Instant::now();
        gate.acquire("example.com").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_second_acquire_waits_out_delay() {
        let gate = test_gate(80);
        let start = Instant::now();
        gate.acquire("example.com").await;
        gate.acquire("example.com").await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_distinct_hosts_do_not_share_budget() {
        let gate = test_gate(500);
        let start = Instant::now();
        gate.acquire("a.example.com").await;
        gate.acquire("b.example.com").await;
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_contended_acquires_are_spaced() {
        let gate = Arc::new(test_gate(50));
        let times = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let gate = Arc::clone(&gate);
            let times = Arc::clone(&times);
            handles.push(tokio::spawn(async move {
                gate.acquire("example.com").await;
                times.lock().unwrap().push(Instant::now());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut passed = times.lock().unwrap().clone();
        passed.sort();
        for pair in passed.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            // Scheduling jitter tolerance, but never below ~the delay
            assert!(
                gap >= Duration::from_millis(45),
                "gate passed two workers {}ms apart",
                gap.as_millis()
            );
        }
    }

    #[tokio::test]
    async fn test_delay_for_unseen_host_is_minimum() {
        let gate = test_gate(250);
        assert_eq!(gate.delay_for("example.com"), Duration::from_millis(250));
    }
}
