use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of one crawled URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordStatus {
    /// The fetch completed with a success status
    Succeeded {
        /// Final HTTP status code
        http_status: u16,
    },

    /// The fetch failed permanently or exhausted its retries
    Failed {
        /// Human-readable failure cause
        reason: String,
    },
}

impl RecordStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, RecordStatus::Failed { .. })
    }
}

/// The durable unit persisted per fetched URL.
///
/// One JSON object per line at the destination; append-only, never mutated
/// after write, and parseable independent of surrounding records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical absolute URL
    pub url: String,

    /// Link-hops from the seed
    pub depth: u32,

    /// Success or failure, with cause
    pub status: RecordStatus,

    /// Stored page content; absent for non-text bodies, failures, and
    /// zero-cap configurations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Distinct absolute URLs discovered on the page, in document order;
    /// empty for non-HTML and failed fetches
    pub links: Vec<String>,

    /// When the final fetch attempt completed
    pub fetched_at: DateTime<Utc>,
}

impl PageRecord {
    /// Builds a failure record carrying no content or links
    pub fn failed(url: String, depth: u32, reason: String) -> Self {
        Self {
            url,
            depth,
            status: RecordStatus::Failed { reason },
            content: None,
            links: Vec::new(),
            fetched_at: Utc::now(),
        }
    }
}
