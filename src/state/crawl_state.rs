use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide crawl counters
///
/// One instance per crawl run, owned by the controller and shared with the
/// workers by `Arc`. Discarded at exit; nothing here is persisted.
/// In-flight task accounting lives in the frontier, where it can be
/// updated under the same lock as the queue.
#[derive(Debug, Default)]
pub struct CrawlState {
    /// Records written (success or failure)
    recorded: AtomicU64,

    /// Records written with Failed status
    failed: AtomicU64,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one written record; `failed` marks a Failed-status record
    pub fn record_written(&self, failed: bool) {
        self.recorded.fetch_add(1, Ordering::SeqCst);
        if failed {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn recorded(&self) -> u64 {
        self.recorded.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }
}
