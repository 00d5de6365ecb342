//! HTTP fetching
//!
//! Client construction, transient/permanent error classification, and the
//! retry loop with exponential backoff. Backoff is an explicit state
//! machine so the schedule can be unit-tested without touching a network.
//!
//! # Retry Table
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx | Success |
//! | HTTP 429 / 5xx | Retry with backoff, then Failed |
//! | Timeout, connection reset | Retry with backoff, then Failed |
//! | Other HTTP 4xx | Failed immediately |
//! | Name-resolution failure | Failed immediately |
//! | Redirect limit exceeded | Failed immediately |

use crate::config::{HttpConfig, LimitsConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// Default base delay before the first retry
pub const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Whether a retry could plausibly succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Worth retrying: timeouts, resets, 5xx, 429
    Transient,
    /// Retrying cannot help: other 4xx, DNS failure, redirect limit
    Permanent,
}

/// Terminal result of fetching one URL, after any retries
#[derive(Debug)]
pub enum FetchOutcome {
    /// The server answered with a success status
    Fetched {
        /// Final HTTP status code
        status: u16,
        /// Content-Type header, if present
        content_type: Option<String>,
        /// Raw response body
        body: Vec<u8>,
        /// URL after following redirects
        final_url: Url,
    },

    /// The fetch failed permanently or exhausted its attempts
    Failed { reason: String },

    /// The crawl was cancelled while this fetch waited out a backoff;
    /// the task is dropped without a record
    Canceled,
}

/// Builds the shared HTTP client
///
/// Redirects are followed by the client up to the configured hop limit;
/// exceeding it surfaces as a redirect error, classified permanent.
pub fn build_http_client(http: &HttpConfig, limits: &LimitsConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(http.user_agent.clone())
        .timeout(Duration::from_secs(http.timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .redirect(Policy::limited(limits.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Classifies a non-success HTTP status.
///
/// Returns `None` for success statuses.
pub fn classify_status(status: StatusCode) -> Option<FailureKind> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Some(FailureKind::Transient)
    } else {
        Some(FailureKind::Permanent)
    }
}

/// Classifies a reqwest transport error
pub fn classify_error(error: &reqwest::Error) -> FailureKind {
    if error.is_redirect() {
        // Policy::limited exhausted: redirect chain too long or looping
        return FailureKind::Permanent;
    }
    if error.is_timeout() {
        return FailureKind::Transient;
    }
    if error.is_connect() {
        // Name resolution is folded into connect errors; a host that does
        // not resolve will not start resolving on retry
        if is_dns_failure(error) {
            return FailureKind::Permanent;
        }
        // Refused and reset connections are worth retrying
        return FailureKind::Transient;
    }
    if error.is_builder() {
        // Malformed request, e.g. a scheme the client cannot speak
        return FailureKind::Permanent;
    }
    FailureKind::Transient
}

/// Detects name-resolution failures inside reqwest's error chain.
///
/// reqwest folds DNS errors into generic connect errors, so the resolver
/// wording in the source chain is the only available signal.
fn is_dns_failure(error: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = source {
        let text = err.to_string().to_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
        {
            return true;
        }
        source = err.source();
    }
    false
}

/// Exponential backoff schedule: an explicit, inspectable state machine.
///
/// `max_attempts` counts the first try plus retries. After a failed
/// attempt, [`Backoff::next_delay`] either yields the wait before the next
/// attempt (doubling each time) or `None` once attempts are exhausted.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max_attempts,
            attempt: 0,
        }
    }

    /// Attempts completed so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Registers a failed attempt and returns the delay before the next
    /// one, or `None` when the attempt budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            None
        } else {
            Some(self.base * 2u32.saturating_pow(self.attempt - 1))
        }
    }
}

/// Fetches a URL, retrying transient failures with exponential backoff.
///
/// Cancellation is observed during backoff waits only: an attempt already
/// on the wire runs to completion (it is bounded by the client timeout).
pub async fn fetch_with_retry(
    client: &Client,
    url: &Url,
    limits: &LimitsConfig,
    cancel: &watch::Receiver<bool>,
) -> FetchOutcome {
    let mut backoff = Backoff::new(BACKOFF_BASE, limits.max_attempts);

    loop {
        match attempt_fetch(client, url).await {
            Ok(outcome) => return outcome,
            Err((reason, FailureKind::Permanent)) => {
                tracing::debug!("Permanent failure for {}: {}", url, reason);
                return FetchOutcome::Failed { reason };
            }
            Err((reason, FailureKind::Transient)) => match backoff.next_delay() {
                None => {
                    tracing::debug!(
                        "Giving up on {} after {} attempts: {}",
                        url,
                        backoff.attempt(),
                        reason
                    );
                    return FetchOutcome::Failed {
                        reason: format!("{} (after {} attempts)", reason, backoff.attempt()),
                    };
                }
                Some(delay) => {
                    tracing::debug!(
                        "Retrying {} in {:?} (attempt {}): {}",
                        url,
                        delay,
                        backoff.attempt(),
                        reason
                    );
                    let mut cancel = cancel.clone();
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        changed = cancel.changed() => {
                            if changed.is_err() || *cancel.borrow() {
                                return FetchOutcome::Canceled;
                            }
                        }
                    }
                }
            },
        }
    }
}

/// Issues a single GET attempt
async fn attempt_fetch(
    client: &Client,
    url: &Url,
) -> Result<FetchOutcome, (String, FailureKind)> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| (describe_error(&e), classify_error(&e)))?;

    let status = response.status();
    if let Some(kind) = classify_status(status) {
        return Err((format!("HTTP {}", status.as_u16()), kind));
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let body = response
        .bytes()
        .await
        .map_err(|e| (format!("body read failed: {}", e), FailureKind::Transient))?;

    Ok(FetchOutcome::Fetched {
        status: status.as_u16(),
        content_type,
        body: body.to_vec(),
        final_url,
    })
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_redirect() {
        "redirect limit exceeded".to_string()
    } else if is_dns_failure(error) {
        "name resolution failed".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}
