//! Crawl engine
//!
//! Fetching, extraction, the worker pool, and the controller that runs
//! them as one lifecycle.

pub mod controller;
pub mod extractor;
pub mod fetcher;
pub mod worker;

pub use controller::{run_crawl, Controller, ControllerState, CrawlSummary, StopReason};
pub use extractor::{extract, ContentKind, ExtractedPage};
pub use fetcher::{build_http_client, FailureKind, FetchOutcome};
pub use worker::{run_worker, WorkerContext};
