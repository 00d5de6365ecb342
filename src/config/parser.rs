use crate::config::types::CrawlConfig;
use crate::config::validation::validate;
use crate::ConfigResult;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(CrawlConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<CrawlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: CrawlConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[limits]
max-depth = 3
max-pages = 500
max-attempts = 2
max-redirects = 5

[politeness]
min-delay-ms = 250
robots-ttl-secs = 3600
max-robots-delay-secs = 30

[http]
timeout-secs = 15
connect-timeout-secs = 5
user-agent = "TestBot/1.0"

[pool]
workers = 4

[output]
max-content-bytes = 1024
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.limits.max_depth, 3);
        assert_eq!(config.limits.max_pages, 500);
        assert_eq!(config.politeness.min_delay_ms, 250);
        assert_eq!(config.http.user_agent, "TestBot/1.0");
        assert_eq!(config.pool.workers, 4);
        assert_eq!(config.output.max_content_bytes, 1024);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config_content = r#"
[limits]
max-depth = 1
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.limits.max_depth, 1);
        // Everything else falls back to defaults
        assert_eq!(config.limits.max_attempts, 4);
        assert_eq!(config.politeness.min_delay_ms, 1000);
        assert_eq!(config.pool.workers, 8);
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.limits.max_depth, 5);
        assert!(config.http.user_agent.starts_with("gleaner/"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_unknown_key() {
        let file = create_temp_config("[limits]\nmax-deepness = 3\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[pool]\nworkers = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
