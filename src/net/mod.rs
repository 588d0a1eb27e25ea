//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection limit permit)
//!     → connection.rs (ID, live-connection tracking)
//!     → proxy layer handles the request
//!     → connector.rs (stream to the origin host:port)
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Every connection is tracked so shutdown can drain it
//! - The proxy core sees only the accept and connect seams, never sockets directly

pub mod connection;
pub mod connector;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use connector::{Connect, TcpConnector};
pub use listener::{ConnectionPermit, Listener, ListenerError};
