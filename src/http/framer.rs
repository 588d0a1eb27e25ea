//! Request framing over a buffered client stream.
//!
//! A request is exactly the bytes from the first line through the first empty
//! (`\r\n`) line. Nothing after that is read, so a body, if the client sent
//! one, stays unread in the stream.

use std::io;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::stream::BufferedStream;

/// Line terminator, also the whole of the empty line that ends a request head.
pub const CRLF: &[u8] = b"\r\n";

/// Errors while framing a request.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The client closed the stream before sending any byte.
    #[error("client closed the connection before sending a request")]
    Closed,

    /// The client closed the stream before the terminating empty line.
    #[error("client closed the connection after {received} bytes of an incomplete request")]
    Incomplete { received: usize },

    /// The request head does not fit in the configured request capacity.
    #[error("request head exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}

/// A complete request head as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    bytes: Vec<u8>,
    line_len: usize,
}

impl RawRequest {
    /// Request line, including its terminator.
    pub fn request_line(&self) -> &[u8] {
        &self.bytes[..self.line_len]
    }

    /// Header lines after the request line, including the terminating empty line.
    pub fn headers(&self) -> &[u8] {
        &self.bytes[self.line_len..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

}

/// Read one request head from `stream`, at most `limit` bytes in total.
///
/// A blank first line is returned as a request of its own so that validation
/// can reject it instead of waiting for more lines.
pub async fn read_request<S>(
    stream: &mut BufferedStream<S>,
    limit: usize,
) -> Result<RawRequest, FrameError>
where
    S: AsyncRead + Unpin,
{
    let mut bytes = Vec::with_capacity(limit.min(stream.capacity()));

    let line_len = read_line(stream, &mut bytes, limit).await?;
    if line_len == 0 {
        return Err(FrameError::Closed);
    }

    if bytes != CRLF {
        loop {
            let start = bytes.len();
            if read_line(stream, &mut bytes, limit).await? == 0 {
                return Err(FrameError::Incomplete {
                    received: bytes.len(),
                });
            }
            if &bytes[start..] == CRLF {
                break;
            }
        }
    }

    Ok(RawRequest { bytes, line_len })
}

async fn read_line<S>(
    stream: &mut BufferedStream<S>,
    bytes: &mut Vec<u8>,
    limit: usize,
) -> Result<usize, FrameError>
where
    S: AsyncRead + Unpin,
{
    // One byte past the room tells an overrun apart from end-of-stream.
    let room = limit.saturating_sub(bytes.len());
    let n = stream.read_line_into(bytes, room.saturating_add(1)).await?;
    if n > room {
        return Err(FrameError::TooLarge { limit });
    }
    Ok(n)
}
