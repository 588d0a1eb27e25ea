//! Minimal HTTP/1.0 forward proxy library.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ net::Listener ──▶ proxy::server ──▶ proxy::handler
//!                                                      │
//!                     stream::BufferedStream ◀─────────┤ framing, I/O
//!                     http::{framer, request, rewrite} ◀┤ validation, rewrite
//!                     net::Connect ◀────────────────────┘ origin connection
//!
//!     Cross-cutting: config, observability, resilience, lifecycle
//! ```
//!
//! Each connection carries exactly one `GET http://host[:port]/path` request.
//! The request is rewritten to an origin-relative HTTP/1.0 request with
//! `Connection: close`, sent to the origin, and the response relayed back.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod proxy;
pub mod stream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ProxyConfig;
pub use lifecycle::Shutdown;
pub use proxy::ProxyServer;
