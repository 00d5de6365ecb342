//! URL frontier and dedup store
//!
//! A FIFO queue of pending crawl tasks plus the set of every canonical URL
//! ever enqueued or visited. Both live under one mutex so the membership
//! check and the insert in [`Frontier::enqueue`] are a single atomic step:
//! two workers discovering the same URL concurrently can never both enqueue
//! it, and the frontier never yields the same URL twice.
//!
//! The frontier also counts checked-out tasks under the same lock, which
//! makes [`Frontier::is_idle`] — queue empty and nothing in flight — a
//! race-free termination signal for the controller.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::{watch, Notify};
use url::Url;

/// A unit of crawl work: one URL awaiting fetch
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// Canonical URL to fetch
    pub url: Url,

    /// Link-hops from the seed (seed = 0)
    pub depth: u32,

    /// The page on which this URL was discovered (None for the seed)
    pub source: Option<Url>,
}

#[derive(Debug, Default)]
struct Inner {
    queue: VecDeque<CrawlTask>,
    known: HashSet<String>,
    /// Tasks dequeued but not yet finished via [`Frontier::task_done`]
    in_flight: usize,
}

/// Shared frontier, FIFO for approximate breadth-first discovery order
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<Inner>,
    /// Wakes workers parked in [`Frontier::next_task`] when work arrives
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task unless its canonical URL is already known.
    ///
    /// Returns `true` if the task was queued, `false` for the dedup no-op.
    /// The URL must already be canonical; membership check and insertion
    /// happen under one lock.
    pub fn enqueue(&self, url: Url, depth: u32, source: Option<Url>) -> bool {
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if !inner.known.insert(url.as_str().to_string()) {
                return false;
            }
            inner.queue.push_back(CrawlTask { url, depth, source });
        }
        self.notify.notify_one();
        true
    }

    /// Pops the next task in FIFO order, or `None` if the queue is empty.
    ///
    /// A popped task counts as in-flight until [`Frontier::task_done`] is
    /// called for it; the increment happens under the queue lock.
    pub fn dequeue(&self) -> Option<CrawlTask> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let task = inner.queue.pop_front();
        if task.is_some() {
            inner.in_flight += 1;
        }
        task
    }

    /// Waits for the next task, returning `None` on cancellation.
    ///
    /// Suspends while the queue is empty; a worker parked here is woken by
    /// either a new enqueue or the cancel signal flipping to true.
    pub async fn next_task(&self, cancel: &mut watch::Receiver<bool>) -> Option<CrawlTask> {
        loop {
            if *cancel.borrow() {
                return None;
            }

            // Register interest before checking the queue so an enqueue
            // between the check and the await cannot be missed.
            let notified = self.notify.notified();

            if let Some(task) = self.dequeue() {
                return Some(task);
            }

            tokio::select! {
                _ = notified => {}
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        return None;
                    }
                }
            }
        }
    }

    /// Marks a previously dequeued task as finished.
    ///
    /// Must be called exactly once per dequeued task, whether the task was
    /// recorded or dropped by cancellation.
    pub fn task_done(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }

    /// Marks a URL permanently ineligible for re-enqueue.
    ///
    /// Idempotent. Called once a record has been written for the URL, and
    /// by the resume scan to seed the dedup store from prior output.
    pub fn mark_visited(&self, url: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.known.insert(url.to_string());
    }

    /// True when no task is queued and none is checked out.
    ///
    /// Evaluated under the single lock, so it cannot observe the gap
    /// between a pop and the matching in-flight increment.
    pub fn is_idle(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.queue.is_empty() && inner.in_flight == 0
    }

    /// Number of tasks currently queued
    pub fn queued(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.queue.len()
    }

    /// Number of tasks currently checked out by workers
    pub fn in_flight(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.in_flight
    }

    /// Number of canonical URLs ever seen (queued or visited)
    pub fn known(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_enqueue_dequeue_fifo() {
        let frontier = Frontier::new();
        assert!(frontier.enqueue(url("https://example.com/a"), 0, None));
        assert!(frontier.enqueue(url("https://example.com/b"), 1, None));

        assert_eq!(frontier.dequeue().unwrap().url.as_str(), "https://example.com/a");
        assert_eq!(frontier.dequeue().unwrap().url.as_str(), "https://example.com/b");
        assert!(frontier.dequeue().is_none());
    }

    #[test]
    fn test_duplicate_enqueue_is_noop() {
        let frontier = Frontier::new();
        assert!(frontier.enqueue(url("https://example.com/a"), 0, None));
        assert!(!frontier.enqueue(url("https://example.com/a"), 1, None));
        assert_eq!(frontier.queued(), 1);

        frontier.dequeue().unwrap();
        // Still known after dequeue: never yielded twice
        assert!(!frontier.enqueue(url("https://example.com/a"), 2, None));
        assert!(frontier.dequeue().is_none());
    }

    #[test]
    fn test_mark_visited_blocks_enqueue() {
        let frontier = Frontier::new();
        frontier.mark_visited("https://example.com/done");
        assert!(!frontier.enqueue(url("https://example.com/done"), 0, None));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_mark_visited_idempotent() {
        let frontier = Frontier::new();
        frontier.mark_visited("https://example.com/x");
        frontier.mark_visited("https://example.com/x");
        assert_eq!(frontier.known(), 1);
    }

    #[test]
    fn test_task_fields_preserved() {
        let frontier = Frontier::new();
        let parent = url("https://example.com/");
        frontier.enqueue(url("https://example.com/child"), 3, Some(parent.clone()));

        let task = frontier.dequeue().unwrap();
        assert_eq!(task.depth, 3);
        assert_eq!(task.source, Some(parent));
    }

    #[test]
    fn test_idle_tracks_in_flight() {
        let frontier = Frontier::new();
        assert!(frontier.is_idle());

        frontier.enqueue(url("https://example.com/a"), 0, None);
        assert!(!frontier.is_idle());

        frontier.dequeue().unwrap();
        // Queue empty but the task is still checked out
        assert!(frontier.is_empty());
        assert!(!frontier.is_idle());
        assert_eq!(frontier.in_flight(), 1);

        frontier.task_done();
        assert!(frontier.is_idle());
    }

    #[tokio::test]
    async fn test_next_task_returns_queued_work() {
        let frontier = Frontier::new();
        frontier.enqueue(url("https://example.com/a"), 0, None);

        let (_tx, mut rx) = watch::channel(false);
        let task = frontier.next_task(&mut rx).await;
        assert!(task.is_some());
    }

    #[tokio::test]
    async fn test_next_task_wakes_on_enqueue() {
        let frontier = Arc::new(Frontier::new());
        let (_tx, mut rx) = watch::channel(false);

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next_task(&mut rx).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        frontier.enqueue(url("https://example.com/late"), 0, None);

        let task = waiter.await.unwrap();
        assert_eq!(task.unwrap().url.as_str(), "https://example.com/late");
    }

    #[tokio::test]
    async fn test_next_task_exits_on_cancel() {
        let frontier = Arc::new(Frontier::new());
        let (tx, mut rx) = watch::channel(false);

        let waiter = {
            let frontier = Arc::clone(&frontier);
            tokio::spawn(async move { frontier.next_task(&mut rx).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        assert!(waiter.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_task_cancel_beats_pending_work() {
        let frontier = Frontier::new();
        frontier.enqueue(url("https://example.com/a"), 0, None);

        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();

        // Already-cancelled workers take no further work
        assert!(frontier.next_task(&mut rx).await.is_none());
    }

    #[test]
    fn test_concurrent_enqueue_single_winner() {
        let frontier = Arc::new(Frontier::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let frontier = Arc::clone(&frontier);
            handles.push(std::thread::spawn(move || {
                frontier.enqueue(url("https://example.com/contested"), 1, None)
            }));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
        assert_eq!(frontier.queued(), 1);
    }
}
