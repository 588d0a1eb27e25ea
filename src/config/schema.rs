//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files. Every
//! field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::stream::DEFAULT_CAPACITY;

/// Root configuration for the forward proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Per-connection buffer sizes.
    pub buffers: BufferConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Buffer sizes, all in bytes and all allocated per connection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BufferConfig {
    /// Internal read buffer of each buffered stream.
    pub stream_capacity: usize,

    /// Limit for the client's request head and for the rewritten request.
    pub request_capacity: usize,

    /// Most bytes of an origin response relayed to the client.
    pub response_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            stream_capacity: DEFAULT_CAPACITY,
            request_capacity: 64_000,
            response_capacity: 64_000,
        }
    }
}

/// Timeout configuration. Unset timeouts never fire.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Origin connection establishment timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Limit in seconds for each read or write phase of a connection.
    pub io_secs: Option<u64>,

    /// How long shutdown waits for in-flight connections, in seconds.
    pub drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: None,
            io_secs: None,
            drain_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Option<Duration> {
        self.connect_secs.map(Duration::from_secs)
    }

    pub fn io(&self) -> Option<Duration> {
        self.io_secs.map(Duration::from_secs)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error, off).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
