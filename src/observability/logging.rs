//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used when `RUST_LOG` is not set.
pub fn default_filter(log_level: &str) -> String {
    format!("forward_proxy={log_level}")
}

/// Initialize the global tracing subscriber.
///
/// Panics if a global subscriber is already installed.
pub fn init(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
