//! Gleaner: a batch web harvester
//!
//! This crate implements a single-process crawler that starts from one seed
//! URL, follows discovered hyperlinks breadth-first, and appends one durable
//! JSON record per fetched page to a destination path. It respects
//! robots.txt and enforces per-host fetch spacing.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod output;
pub mod politeness;
pub mod robots;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gleaner operations.
///
/// Only fatal conditions surface through this type; per-page fetch and
/// extraction failures are recorded in that page's output record instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL {url:?}: {source}")]
    InvalidSeed { url: String, source: UrlError },

    #[error("Destination {path} is not writable: {source}")]
    Destination {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Record writer closed unexpectedly")]
    WriterClosed,

    #[error("Worker task panicked: {0}")]
    WorkerPanic(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for gleaner operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{run_crawl, CrawlSummary};
pub use output::{PageRecord, RecordStatus};
pub use url::{canonicalize, host_key};
