use crate::robots::CachedRobots;
use std::time::{Duration, Instant};

/// Per-host crawl state
///
/// Tracks the spacing clock, the effective crawl delay, and the cached
/// robots.txt rules for one host. The politeness gate owns a map of these,
/// one per host contacted during the run.
#[derive(Debug, Clone)]
pub struct HostState {
    /// Timestamp of the last fetch issued to this host
    pub last_fetch: Option<Instant>,

    /// Effective spacing between fetches: the configured minimum, raised by
    /// a robots.txt Crawl-delay when one applies
    pub crawl_delay: Duration,

    /// Cached robots.txt rules, present after first contact
    pub robots: Option<CachedRobots>,
}

impl HostState {
    /// Creates state for a newly-seen host with the configured minimum delay
    pub fn new(min_delay: Duration) -> Self {
        Self {
            last_fetch: None,
            crawl_delay: min_delay,
            robots: None,
        }
    }

    /// Time remaining until this host accepts another fetch.
    ///
    /// Returns `None` when a fetch may be issued now.
    pub fn ready_in(&self, now: Instant) -> Option<Duration> {
        let last = self.last_fetch?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.crawl_delay {
            Some(self.crawl_delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a fetch was issued to this host at `now`.
    ///
    /// The caller must invoke this under the same lock as the `ready_in`
    /// check; together they form the gate's atomic reservation.
    pub fn record_fetch(&mut self, now: Instant) {
        self.last_fetch = Some(now);
    }

    /// Raises the effective delay from a robots.txt Crawl-delay directive.
    ///
    /// The result is `max(min_delay, robots_delay)` with the robots value
    /// capped at `max_robots_delay`, so a pathological directive cannot
    /// stall an unattended run.
    pub fn apply_robots_delay(
        &mut self,
        robots_delay_secs: f64,
        min_delay: Duration,
        max_robots_delay: Duration,
    ) {
        let robots_delay = Duration::from_secs_f64(robots_delay_secs.max(0.0));
        let capped = robots_delay.min(max_robots_delay);
        self.crawl_delay = min_delay.max(capped);
    }
}
