//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, sizes and timeouts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::ProxyConfig;
use crate::http::rewrite::min_rewritten_len;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("buffers.{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("buffers.request_capacity {capacity} is below the {required} bytes of the smallest rewritten request")]
    RequestCapacityTooSmall { capacity: usize, required: usize },

    #[error("timeouts.{0} must be greater than zero when set")]
    ZeroTimeout(&'static str),

    #[error("observability.log_level {0:?} is not a log level")]
    InvalidLogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    let buffers = &config.buffers;
    for (name, value) in [
        ("stream_capacity", buffers.stream_capacity),
        ("request_capacity", buffers.request_capacity),
        ("response_capacity", buffers.response_capacity),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroCapacity(name));
        }
    }
    let required = min_rewritten_len();
    if buffers.request_capacity != 0 && buffers.request_capacity < required {
        errors.push(ValidationError::RequestCapacityTooSmall {
            capacity: buffers.request_capacity,
            required,
        });
    }

    if config.timeouts.connect_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.io_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("io_secs"));
    }

    let observability = &config.observability;
    if observability.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            observability.log_level.clone(),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
