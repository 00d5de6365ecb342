use crate::config::types::CrawlConfig;
use crate::{ConfigError, ConfigResult};

/// Validates a crawl configuration
///
/// Every numeric knob that the crawl loop divides by, spawns from, or
/// retries against must be positive; a zero here would hang or no-op the
/// run rather than fail it.
pub fn validate(config: &CrawlConfig) -> ConfigResult<()> {
    if config.pool.workers == 0 {
        return Err(ConfigError::Validation(
            "pool.workers must be at least 1".to_string(),
        ));
    }

    if config.limits.max_attempts == 0 {
        return Err(ConfigError::Validation(
            "limits.max-attempts must be at least 1".to_string(),
        ));
    }

    if config.limits.max_pages == 0 {
        return Err(ConfigError::Validation(
            "limits.max-pages must be at least 1".to_string(),
        ));
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.http.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.connect-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.http.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "http.user-agent must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CrawlConfig::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = CrawlConfig::default();
        config.pool.workers = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = CrawlConfig::default();
        config.limits.max_attempts = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        let mut config = CrawlConfig::default();
        config.limits.max_pages = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = CrawlConfig::default();
        config.http.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_user_agent_rejected() {
        let mut config = CrawlConfig::default();
        config.http.user_agent = "   ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_max_depth_zero_is_valid() {
        // Depth 0 means "fetch only the seed" and is a supported run
        let mut config = CrawlConfig::default();
        config.limits.max_depth = 0;
        assert!(validate(&config).is_ok());
    }
}
