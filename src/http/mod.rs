//! HTTP request handling subsystem.
//!
//! # Data Flow
//! ```text
//! BufferedStream (client)
//!     → framer.rs (request line + headers up to the empty line)
//!     → request.rs (validate tokens, scheme, method)
//!     → rewrite.rs (origin-relative request + target host/port)
//!     → forwarded to origin by the proxy layer
//!
//! On rejection:
//!     → response.rs (fixed 400 / 501 status line) → client
//! ```
//!
//! # Design Decisions
//! - Exactly one request per connection; bodies are never read
//! - All parsing goes through `cursor.rs` over borrowed bytes
//! - Size limits are per connection and fail only that connection

pub mod cursor;
pub mod framer;
pub mod request;
pub mod response;
pub mod rewrite;

pub use framer::{read_request, FrameError, RawRequest};
pub use request::{RequestError, RequestLine};
pub use response::Rejection;
pub use rewrite::{rewrite_request, RewriteError, RewrittenRequest, Target};
