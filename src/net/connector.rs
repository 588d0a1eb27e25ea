//! Origin connections.
//!
//! The proxy core only needs "give me a stream to host:port". [`Connect`] is
//! that seam; [`TcpConnector`] is the production implementation and tests
//! substitute in-memory streams.

use std::future::Future;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens bidirectional streams to origin servers.
pub trait Connect: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `host:port`. Name resolution is the implementation's concern.
    fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Connects over TCP, trying each resolved address in turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connect for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, host: &str, port: u16) -> impl Future<Output = io::Result<TcpStream>> + Send {
        let addr = (host.to_owned(), port);
        async move {
            let stream = TcpStream::connect(addr).await?;
            tracing::trace!(peer_addr = ?stream.peer_addr().ok(), "Origin connected");
            Ok(stream)
        }
    }
}
