//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), ProxyConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:3128"

            [buffers]
            response_capacity = 1048576

            [timeouts]
            connect_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:3128");
        assert_eq!(config.listener.max_connections, 10_000);
        assert_eq!(config.buffers.response_capacity, 1_048_576);
        assert_eq!(config.buffers.request_capacity, 64_000);
        assert_eq!(config.timeouts.connect(), Some(Duration::from_secs(5)));
        assert_eq!(config.timeouts.io(), None);
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = parse_config("[listener\nbind_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn semantic_errors_are_listed() {
        let err = parse_config("[listener]\nmax_connections = 0\n[timeouts]\nconnect_secs = 0\n")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: listener.max_connections must be greater than zero, \
             timeouts.connect_secs must be greater than zero when set"
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/forward-proxy.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/forward-proxy.toml"));
    }
}
