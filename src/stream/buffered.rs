//! Buffered reader/writer over a bidirectional byte stream.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default size of the internal read buffer.
pub const DEFAULT_CAPACITY: usize = 8192;

/// A byte stream with an internal read buffer.
///
/// # Ownership
///
/// Wrapping a stream transfers read ownership to the `BufferedStream`. Once any
/// read has gone through it, the inner stream must not be read directly: bytes
/// already pulled into the buffer would be skipped and lost. [`get_mut`] and
/// [`into_inner`] exist for writes and teardown, not for reads.
///
/// Writes are not buffered and may go to the inner stream at any time.
///
/// [`get_mut`]: BufferedStream::get_mut
/// [`into_inner`]: BufferedStream::into_inner
pub struct BufferedStream<S> {
    inner: S,
    buf: Box<[u8]>,
    /// Offset of the first unread byte in `buf`.
    pos: usize,
    /// Unread bytes starting at `pos`. `pos + remaining <= buf.len()`.
    remaining: usize,
}

impl<S> BufferedStream<S> {
    /// Wrap `inner` with a buffer of [`DEFAULT_CAPACITY`] bytes.
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    /// Wrap `inner` with a buffer of `capacity` bytes (at least one).
    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            remaining: 0,
        }
    }

    /// Size of the internal buffer.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes read from the stream but not yet handed to a caller.
    pub fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..self.pos + self.remaining]
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutable access to the inner stream. See the ownership note on the type.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap the inner stream, discarding any buffered bytes.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.remaining);
        self.pos += n;
        self.remaining -= n;
    }
}

impl<S: AsyncRead + Unpin> BufferedStream<S> {
    /// Read one line into `dst`, followed by a `0` sentinel.
    ///
    /// Stops after copying `\n`, after writing `dst.len() - 1` bytes, or at
    /// end-of-stream. Returns the number of bytes written, not counting the
    /// sentinel; `0` means end-of-stream. A line longer than `dst` is
    /// truncated and the rest stays in the stream for the next read.
    pub async fn read_line(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let Some(limit) = dst.len().checked_sub(1) else {
            return Ok(0);
        };

        let mut written = 0;
        let result = loop {
            if written == limit {
                break Ok(written);
            }
            match self.next_byte().await {
                Ok(Some(byte)) => {
                    dst[written] = byte;
                    written += 1;
                    if byte == b'\n' {
                        break Ok(written);
                    }
                }
                Ok(None) => break Ok(written),
                Err(e) => break Err(e),
            }
        };

        dst[written] = 0;
        result
    }

    /// Append one line to `out`, reading at most `limit` bytes.
    ///
    /// Same stopping rules as [`read_line`](Self::read_line) but growing a
    /// caller-owned buffer instead of filling a fixed slice. Returns the number
    /// of bytes appended; `0` means end-of-stream (or `limit == 0`).
    pub async fn read_line_into(&mut self, out: &mut Vec<u8>, limit: usize) -> io::Result<usize> {
        let mut appended = 0;
        while appended < limit {
            match self.next_byte().await? {
                Some(byte) => {
                    out.push(byte);
                    appended += 1;
                    if byte == b'\n' {
                        break;
                    }
                }
                None => break,
            }
        }
        Ok(appended)
    }

    /// Read until `dst` is full or the stream ends.
    ///
    /// Returns the number of bytes copied. A short count means the peer closed
    /// the stream; callers treat `dst` as an upper bound, not an expected length.
    pub async fn read_n(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let mut copied = 0;
        while copied < dst.len() {
            let n = self.read_buffered(&mut dst[copied..]).await?;
            if n == 0 {
                break;
            }
            copied += n;
        }
        Ok(copied)
    }

    async fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.remaining == 0 && self.fill().await? == 0 {
            return Ok(None);
        }
        let byte = self.buf[self.pos];
        self.consume(1);
        Ok(Some(byte))
    }

    async fn read_buffered(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 && self.fill().await? == 0 {
            return Ok(0);
        }
        let n = self.remaining.min(dst.len());
        dst[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.consume(n);
        Ok(n)
    }

    /// Refill the empty buffer with a single read. `Ok(0)` is end-of-stream.
    async fn fill(&mut self) -> io::Result<usize> {
        debug_assert_eq!(self.remaining, 0);
        loop {
            match self.inner.read(&mut self.buf).await {
                Ok(n) => {
                    self.pos = 0;
                    self.remaining = n;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<S: AsyncWrite + Unpin> BufferedStream<S> {
    /// Write all of `src`, resuming after short or interrupted writes.
    ///
    /// A write that accepts zero bytes is reported as [`io::ErrorKind::WriteZero`].
    pub async fn write_all(&mut self, mut src: &[u8]) -> io::Result<()> {
        while !src.is_empty() {
            match self.inner.write(src).await {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "stream accepted zero bytes",
                    ))
                }
                Ok(n) => src = &src[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.inner.flush().await
    }

    /// Flush and close the write half of the stream.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }
}
