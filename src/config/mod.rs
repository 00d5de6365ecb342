//! Crawl configuration
//!
//! Configuration is optional: every knob has a default, a TOML file can
//! override any section, and CLI flags override the file. Validation runs
//! after all overrides are applied.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{
    CrawlConfig, HttpConfig, LimitsConfig, OutputConfig, PolitenessConfig, PoolConfig,
};
pub use validation::validate;
