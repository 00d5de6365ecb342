//! Shared crawl state
//!
//! Per-host politeness state and process-wide counters. Both are owned
//! explicitly by the controller and passed to workers by shared reference;
//! there are no ambient globals.

mod crawl_state;
mod host_state;

pub use crawl_state::CrawlState;
pub use host_state::HostState;
