//! Fetch workers
//!
//! Each worker runs one loop: take a task from the frontier, pass the
//! politeness gate, fetch with retry, extract, enqueue discoveries, write
//! the record. Every dequeued task is balanced with a `task_done` call so
//! the controller's idle detection stays accurate even when a task is
//! dropped by cancellation.

use crate::config::CrawlConfig;
use crate::crawler::extractor::extract;
use crate::crawler::fetcher::{fetch_with_retry, FetchOutcome};
use crate::frontier::{CrawlTask, Frontier};
use crate::output::{PageRecord, RecordStatus, RecordWriter};
use crate::politeness::PolitenessGate;
use crate::state::CrawlState;
use crate::url::host_key;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::watch;

/// Everything a worker needs, shared across the pool
#[derive(Clone)]
pub struct WorkerContext {
    pub config: Arc<CrawlConfig>,
    pub client: Client,
    pub frontier: Arc<Frontier>,
    pub gate: Arc<PolitenessGate>,
    pub state: Arc<CrawlState>,
    pub writer: RecordWriter,
}

/// Worker main loop: runs until the frontier signals cancellation.
///
/// Returns early if the writer has shut down, since no further record
/// could be persisted.
pub async fn run_worker(id: usize, ctx: WorkerContext, mut cancel: watch::Receiver<bool>) {
    tracing::debug!("Worker {} started", id);

    while let Some(task) = ctx.frontier.next_task(&mut cancel).await {
        let url = task.url.clone();
        let result = process_task(&ctx, task, &cancel).await;
        ctx.frontier.task_done();

        if result.is_err() {
            tracing::warn!("Worker {} stopping: writer is gone ({})", id, url);
            break;
        }
    }

    tracing::debug!("Worker {} finished", id);
}

/// Carries one task from dequeue to record.
///
/// Err means the writer channel is closed; the task is lost either way.
async fn process_task(
    ctx: &WorkerContext,
    task: CrawlTask,
    cancel: &watch::Receiver<bool>,
) -> Result<(), crate::CrawlError> {
    let CrawlTask { url, depth, source } = task;
    let host = host_key(&url);

    tracing::debug!(
        "Processing {} at depth {} (found on {})",
        url,
        depth,
        source.as_ref().map(|u| u.as_str()).unwrap_or("seed")
    );

    if !ctx.gate.check_allowed(&url).await {
        tracing::info!("Skipping {} (disallowed by robots.txt)", url);
        let record = PageRecord::failed(
            url.as_str().to_string(),
            depth,
            "disallowed by robots.txt".to_string(),
        );
        return write_record(ctx, record).await;
    }

    // Cancellation observed while queued behind the per-host delay drops
    // the task without a record
    {
        let mut cancel = cancel.clone();
        tokio::select! {
            _ = ctx.gate.acquire(&host) => {}
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    tracing::debug!("Dropping {} (cancelled at politeness gate)", url);
                    return Ok(());
                }
            }
        }
    }

    match fetch_with_retry(&ctx.client, &url, &ctx.config.limits, cancel).await {
        FetchOutcome::Canceled => {
            tracing::debug!("Dropping {} (cancelled during retry backoff)", url);
            Ok(())
        }
        FetchOutcome::Failed { reason } => {
            tracing::info!("Fetch failed for {}: {}", url, reason);
            write_record(ctx, PageRecord::failed(url.as_str().to_string(), depth, reason)).await
        }
        FetchOutcome::Fetched {
            status,
            content_type,
            body,
            final_url,
        } => {
            let page = extract(
                &body,
                content_type.as_deref(),
                &final_url,
                ctx.config.output.max_content_bytes,
            );
            tracing::debug!(
                "Fetched {} ({} bytes, {} links)",
                url,
                body.len(),
                page.links.len()
            );

            // Discovered links are always recorded; they only become new
            // tasks while the crawl is live and within the depth bound
            let child_depth = depth.saturating_add(1);
            if !*cancel.borrow() && child_depth <= ctx.config.limits.max_depth {
                for link in &page.links {
                    ctx.frontier.enqueue(link.clone(), child_depth, Some(url.clone()));
                }
            }

            let record = PageRecord {
                url: url.as_str().to_string(),
                depth,
                status: RecordStatus::Succeeded {
                    http_status: status,
                },
                content: page.content,
                links: page.links.iter().map(|u| u.as_str().to_string()).collect(),
                fetched_at: Utc::now(),
            };
            write_record(ctx, record).await
        }
    }
}

/// Persists a record and updates crawl counters and dedup state
async fn write_record(ctx: &WorkerContext, record: PageRecord) -> Result<(), crate::CrawlError> {
    let failed = record.status.is_failed();
    let url = record.url.clone();
    ctx.writer.append(record).await?;
    ctx.state.record_written(failed);
    ctx.frontier.mark_visited(&url);
    Ok(())
}
