//! Forward proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Listener::accept
//!     → server.rs (spawn task, span, outcome metrics)
//!     → handler.rs (frame, validate, rewrite, connect, relay)
//!     → client receives the origin response or a 400 / 501
//! ```
//!
//! # Design Decisions
//! - One task per connection; connections share only immutable settings
//! - The origin connector is generic so tests run without real sockets

pub mod handler;
pub mod server;

pub use handler::{handle_connection, ConnectionError, ConnectionSettings, Outcome};
pub use server::ProxyServer;
