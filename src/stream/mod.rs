//! Buffered stream subsystem.
//!
//! # Data Flow
//! ```text
//! raw socket (client or origin)
//!     → buffered.rs (internal read buffer, one fill per exhausted buffer)
//!     → read_line / read_line_into  (framer: one header line at a time)
//!     → read_n                       (relay: drain origin response)
//!     → write_all                    (rewritten request, relayed response)
//! ```
//!
//! # Design Decisions
//! - One `BufferedStream` per connection side, never shared
//! - Line reads copy byte-by-byte out of the buffer so the cursor stops on the
//!   line boundary; the underlying read still happens in full-buffer chunks
//! - Interrupted reads and writes are resumed transparently, nothing else is retried

pub mod buffered;

pub use buffered::{BufferedStream, DEFAULT_CAPACITY};
