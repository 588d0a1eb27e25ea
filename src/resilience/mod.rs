//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connection phase (request read, origin connect, origin write,
//! origin read, client write):
//!     → timeouts.rs (optional deadline per phase)
//!     → on expiry the connection is dropped, nothing is retried
//! ```
//!
//! # Design Decisions
//! - Fail fast per connection; no retries or backoff
//! - Deadlines are opt-in through `[timeouts]` in the config

pub mod timeouts;

pub use timeouts::{with_deadline, TimedOut};
