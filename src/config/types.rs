use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for a crawl run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlConfig {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl termination and retry limits
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum link-hop depth from the seed URL (0 = seed only)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of page records to write before draining
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u64,

    /// Maximum fetch attempts per URL (first try + retries)
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Maximum redirect hops before a fetch fails permanently
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,
}

/// Per-host rate limiting and robots.txt handling
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolitenessConfig {
    /// Minimum spacing between two fetches to the same host (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// How long a cached robots.txt stays valid (seconds)
    #[serde(rename = "robots-ttl-secs", default = "default_robots_ttl_secs")]
    pub robots_ttl_secs: u64,

    /// Upper bound honored for a robots.txt Crawl-delay directive (seconds)
    #[serde(
        rename = "max-robots-delay-secs",
        default = "default_max_robots_delay_secs"
    )]
    pub max_robots_delay_secs: u64,
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Number of concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Record output behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Cap on stored page content, in bytes (0 = store no content)
    #[serde(rename = "max-content-bytes", default = "default_max_content_bytes")]
    pub max_content_bytes: usize,
}

fn default_max_depth() -> u32 {
    5
}

fn default_max_pages() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    4
}

fn default_max_redirects() -> usize {
    10
}

fn default_min_delay_ms() -> u64 {
    1_000
}

fn default_robots_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_robots_delay_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("gleaner/{}", env!("CARGO_PKG_VERSION"))
}

fn default_workers() -> usize {
    8
}

fn default_max_content_bytes() -> usize {
    256 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            max_attempts: default_max_attempts(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            robots_ttl_secs: default_robots_ttl_secs(),
            max_robots_delay_secs: default_max_robots_delay_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_content_bytes: default_max_content_bytes(),
        }
    }
}

impl PolitenessConfig {
    /// The configured minimum per-host delay as a Duration
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}
