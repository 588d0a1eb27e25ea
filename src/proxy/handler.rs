//! Per-connection request handling.
//!
//! # Sequence
//! ```text
//! client ──read_request──▶ RawRequest
//!        ──RequestLine::parse──▶ 400 / 501 on failure
//!        ──rewrite_request──▶ 400 on malformed target, close on overrun
//!        ──Connect::connect──▶ origin
//!        ──write_all──▶ origin ──read_n──▶ response ──write_all──▶ client
//! ```
//!
//! # Design Decisions
//! - Exactly one request per connection, then both sides are closed
//! - The response is relayed up to `response_capacity`; the rest is dropped
//! - Both streams are owned here and closed by drop on every exit path

use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ProxyConfig;
use crate::http::{
    read_request, rewrite_request, FrameError, Rejection, RequestLine, RewriteError, Target,
};
use crate::net::Connect;
use crate::observability::metrics;
use crate::resilience::{with_deadline, TimedOut};
use crate::stream::BufferedStream;

/// Buffer sizes and deadlines applied to every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub stream_capacity: usize,
    pub request_capacity: usize,
    pub response_capacity: usize,
    pub connect_timeout: Option<Duration>,
    pub io_timeout: Option<Duration>,
}

impl From<&ProxyConfig> for ConnectionSettings {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            stream_capacity: config.buffers.stream_capacity,
            request_capacity: config.buffers.request_capacity,
            response_capacity: config.buffers.response_capacity,
            connect_timeout: config.timeouts.connect(),
            io_timeout: config.timeouts.io(),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from(&ProxyConfig::default())
    }
}

/// How a connection ended when no error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The client closed the connection before sending anything.
    Closed,

    /// The request was refused with an error response.
    Rejected(Rejection),

    /// The request reached the origin and its response was relayed.
    Forwarded {
        target: Target,
        request_bytes: usize,
        response_bytes: usize,
        /// The response filled the relay buffer and may have been cut short.
        at_capacity: bool,
    },
}

impl Outcome {
    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Closed => "closed",
            Outcome::Rejected(Rejection::BadRequest) => "bad_request",
            Outcome::Rejected(Rejection::NotImplemented) => "not_implemented",
            Outcome::Forwarded { .. } => "forwarded",
        }
    }
}

/// Failures that end a connection without a proper response.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to read request: {0}")]
    Frame(#[from] FrameError),

    #[error("failed to rewrite request: {0}")]
    Rewrite(RewriteError),

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("failed to send request to origin: {0}")]
    OriginWrite(#[source] io::Error),

    #[error("failed to read response from origin: {0}")]
    OriginRead(#[source] io::Error),

    #[error("failed to write to client: {0}")]
    ClientWrite(#[source] io::Error),

    #[error(transparent)]
    TimedOut(#[from] TimedOut),
}

impl ConnectionError {
    /// Metric label for this failure.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionError::TimedOut(_) => "timed_out",
            ConnectionError::Frame(FrameError::TooLarge { .. })
            | ConnectionError::Rewrite(RewriteError::BufferTooSmall { .. }) => "too_large",
            _ => "error",
        }
    }
}

/// Serve one proxied request on `client`.
pub async fn handle_connection<S, C>(
    client: S,
    connector: &C,
    settings: &ConnectionSettings,
) -> Result<Outcome, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: Connect,
{
    let io_timeout = settings.io_timeout;
    let mut client = BufferedStream::with_capacity(client, settings.stream_capacity);

    let raw = match with_deadline(
        io_timeout,
        "request read",
        read_request(&mut client, settings.request_capacity),
    )
    .await?
    {
        Ok(raw) => raw,
        Err(FrameError::Closed) => {
            tracing::debug!("Client closed before sending a request");
            return Ok(Outcome::Closed);
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = RequestLine::parse(raw.request_line()) {
        tracing::info!(error = %e, "Rejecting request");
        return reject(&mut client, e.rejection(), io_timeout).await;
    }

    let rewritten = match rewrite_request(raw.as_bytes(), settings.request_capacity) {
        Ok(rewritten) => rewritten,
        Err(e) => {
            return match e.rejection() {
                Some(rejection) => {
                    tracing::info!(error = %e, "Rejecting request");
                    reject(&mut client, rejection, io_timeout).await
                }
                None => Err(ConnectionError::Rewrite(e)),
            };
        }
    };
    let target = rewritten.target;
    tracing::debug!(
        host = %target.host,
        port = target.port,
        path = %target.path,
        "Forwarding request"
    );

    let stream = with_deadline(
        settings.connect_timeout,
        "origin connect",
        connector.connect(&target.host, target.port),
    )
    .await?
    .map_err(|source| ConnectionError::Connect {
        host: target.host.clone(),
        port: target.port,
        source,
    })?;
    let mut origin = BufferedStream::with_capacity(stream, settings.stream_capacity);

    with_deadline(io_timeout, "origin write", origin.write_all(&rewritten.bytes))
        .await?
        .map_err(ConnectionError::OriginWrite)?;
    metrics::record_bytes("upstream", rewritten.bytes.len());

    let mut response = vec![0; settings.response_capacity];
    let received = with_deadline(io_timeout, "origin read", origin.read_n(&mut response))
        .await?
        .map_err(ConnectionError::OriginRead)?;
    drop(origin);

    let at_capacity = received == response.len();
    if at_capacity {
        tracing::warn!(
            %target,
            capacity = settings.response_capacity,
            "Response reached relay capacity, remainder dropped"
        );
    }

    with_deadline(io_timeout, "client write", client.write_all(&response[..received]))
        .await?
        .map_err(ConnectionError::ClientWrite)?;
    metrics::record_bytes("downstream", received);
    close(&mut client).await;

    tracing::info!(
        %target,
        path = %target.path,
        request_bytes = rewritten.bytes.len(),
        response_bytes = received,
        "Request forwarded"
    );

    Ok(Outcome::Forwarded {
        target,
        request_bytes: rewritten.bytes.len(),
        response_bytes: received,
        at_capacity,
    })
}

async fn reject<S>(
    client: &mut BufferedStream<S>,
    rejection: Rejection,
    io_timeout: Option<Duration>,
) -> Result<Outcome, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    with_deadline(io_timeout, "client write", client.write_all(rejection.as_bytes()))
        .await?
        .map_err(ConnectionError::ClientWrite)?;
    tracing::debug!(status = rejection.status_code(), "Rejection sent");
    close(client).await;
    Ok(Outcome::Rejected(rejection))
}

/// Half-close toward the client. The peer may already be gone.
async fn close<S>(client: &mut BufferedStream<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Err(e) = client.shutdown().await {
        tracing::debug!(error = %e, "Client shutdown failed");
    }
}
