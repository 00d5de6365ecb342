//! Crawl lifecycle
//!
//! The controller owns the run: it validates inputs, opens the writer,
//! seeds the frontier, spawns the worker pool, and watches for one of the
//! three stop conditions (frontier idle, page limit reached, external
//! shutdown). Stopping always drains: the cancel signal goes out, workers
//! finish or drop their current task, the writer flushes, and only then
//! does the run report Stopped.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::worker::{run_worker, WorkerContext};
use crate::frontier::Frontier;
use crate::output::{resolve_destination, scan_completed, spawn_writer};
use crate::politeness::PolitenessGate;
use crate::state::CrawlState;
use crate::url::canonicalize;
use crate::{CrawlError, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use url::Url;

/// How often the controller re-evaluates the stop conditions
const MONITOR_INTERVAL: Duration = Duration::from_millis(50);

/// Lifecycle phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Validating inputs and opening the destination
    Starting,
    /// Workers are fetching
    Running,
    /// Stop condition met; cancel sent, waiting for workers and writer
    Draining,
    /// Clean exit; the destination holds every written record
    Stopped,
    /// Startup failed before any worker ran
    Failed,
}

/// Final accounting for a completed crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// Records written, successes and failures combined
    pub pages: u64,
    /// Records with Failed status
    pub failures: u64,
    /// Distinct canonical URLs discovered (visited or still queued)
    pub discovered: u64,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Why the crawl stopped
    pub stop_reason: StopReason,
}

/// Which stop condition ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Frontier empty with no task in flight
    Exhausted,
    /// Page-record limit reached
    PageLimit,
    /// External shutdown signal
    Interrupted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "frontier exhausted"),
            StopReason::PageLimit => write!(f, "page limit reached"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Orchestrates one crawl run from seed to summary
pub struct Controller {
    config: Arc<CrawlConfig>,
    seed: Url,
    records_path: PathBuf,
    resume: bool,
    state: ControllerState,
    /// Shared handles retained for the final summary
    crawl_parts: Option<(Arc<Frontier>, Arc<CrawlState>)>,
}

impl Controller {
    /// Validates the seed and destination and prepares a run.
    ///
    /// # Arguments
    ///
    /// * `seed` - Starting URL; must be absolute http/https
    /// * `dest` - Records file or directory to write into
    /// * `config` - Crawl configuration, already validated
    /// * `resume` - Skip URLs already recorded at the destination
    pub fn new(seed: &str, dest: &Path, config: CrawlConfig, resume: bool) -> Result<Self> {
        let seed = canonicalize(seed).map_err(|source| CrawlError::InvalidSeed {
            url: seed.to_string(),
            source,
        })?;
        let records_path = resolve_destination(dest)?;

        Ok(Self {
            config: Arc::new(config),
            seed,
            records_path,
            resume,
            state: ControllerState::Starting,
            crawl_parts: None,
        })
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Runs the crawl to completion.
    ///
    /// `shutdown` is an external stop signal (typically Ctrl-C); when it
    /// resolves the crawl drains and exits cleanly. Pass a future that
    /// never resolves to run unattended.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<CrawlSummary>
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();

        let setup = self.start_up().await;
        let (ctx, writer_handle) = match setup {
            Ok(parts) => parts,
            Err(e) => {
                self.state = ControllerState::Failed;
                return Err(e);
            }
        };

        self.state = ControllerState::Running;
        tracing::info!(
            "Crawl started from {} with {} workers (max depth {}, max pages {})",
            self.seed,
            self.config.pool.workers,
            self.config.limits.max_depth,
            self.config.limits.max_pages
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut workers = Vec::with_capacity(self.config.pool.workers);
        for id in 0..self.config.pool.workers {
            workers.push(tokio::spawn(run_worker(id, ctx.clone(), cancel_rx.clone())));
        }

        let stop_reason = self.monitor(&ctx, shutdown).await;

        self.state = ControllerState::Draining;
        tracing::info!("Draining: {}", stop_reason);
        let _ = cancel_tx.send(true);

        let mut worker_panic = None;
        for worker in workers {
            if let Err(e) = worker.await {
                if e.is_panic() {
                    worker_panic = Some(CrawlError::WorkerPanic(e.to_string()));
                }
            }
        }

        // Dropping the last writer handle closes the channel; the writer
        // task drains what remains and flushes
        drop(ctx);
        let written = writer_handle
            .await
            .map_err(|e| CrawlError::WorkerPanic(e.to_string()))??;

        if let Some(panic) = worker_panic {
            self.state = ControllerState::Failed;
            return Err(panic);
        }

        self.state = ControllerState::Stopped;

        let summary = CrawlSummary {
            pages: written,
            failures: self.failures_hint(),
            discovered: self.discovered_hint(),
            duration: started.elapsed(),
            stop_reason,
        };
        tracing::info!(
            "Crawl stopped ({}): {} pages in {:.1}s, {} failures",
            summary.stop_reason,
            summary.pages,
            summary.duration.as_secs_f64(),
            summary.failures
        );
        Ok(summary)
    }

    /// Opens the writer, runs the optional resume scan, and seeds the
    /// frontier
    async fn start_up(
        &mut self,
    ) -> Result<(
        WorkerContext,
        tokio::task::JoinHandle<std::io::Result<u64>>,
    )> {
        let client = build_http_client(&self.config.http, &self.config.limits)?;
        let gate = PolitenessGate::new(
            client.clone(),
            self.config.politeness.clone(),
            self.config.http.user_agent.clone(),
        );
        let frontier = Arc::new(Frontier::new());
        let state = Arc::new(CrawlState::new());

        if self.resume {
            let completed = scan_completed(&self.records_path)?;
            for url in &completed {
                frontier.mark_visited(url);
            }
        }

        let (writer, writer_handle) = spawn_writer(self.records_path.clone()).await?;

        if !frontier.enqueue(self.seed.clone(), 0, None) {
            tracing::info!("Seed {} already recorded at destination", self.seed);
        }

        let ctx = WorkerContext {
            config: Arc::clone(&self.config),
            client,
            frontier,
            gate: Arc::new(gate),
            state,
            writer,
        };
        self.crawl_parts = Some((Arc::clone(&ctx.frontier), Arc::clone(&ctx.state)));

        Ok((ctx, writer_handle))
    }

    /// Blocks until a stop condition is met
    async fn monitor<F>(&self, ctx: &WorkerContext, shutdown: F) -> StopReason
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(MONITOR_INTERVAL);

        loop {
            tokio::select! {
                _ = &mut shutdown => return StopReason::Interrupted,
                _ = ticker.tick() => {
                    if ctx.state.recorded() >= self.config.limits.max_pages {
                        return StopReason::PageLimit;
                    }
                    if ctx.frontier.is_idle() {
                        return StopReason::Exhausted;
                    }
                }
            }
        }
    }

    fn failures_hint(&self) -> u64 {
        self.crawl_parts
            .as_ref()
            .map(|(_, state)| state.failed())
            .unwrap_or(0)
    }

    fn discovered_hint(&self) -> u64 {
        self.crawl_parts
            .as_ref()
            .map(|(frontier, _)| frontier.known() as u64)
            .unwrap_or(0)
    }
}

/// Runs a crawl unattended: no external shutdown signal.
///
/// The run ends when the frontier is exhausted or the page limit is hit.
pub async fn run_crawl(
    seed: &str,
    dest: &Path,
    config: CrawlConfig,
    resume: bool,
) -> Result<CrawlSummary> {
    let mut controller = Controller::new(seed, dest, config, resume)?;
    controller.run(std::future::pending()).await
}
