//! Accept loop for the forward proxy.
//!
//! # Responsibilities
//! - Accept clients from the bounded listener
//! - Spawn one task per connection, each inside its own tracing span
//! - Record the outcome of every connection
//! - Stop accepting on shutdown and drain in-flight connections

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::net::{Connect, ConnectionTracker, Listener, ListenerError, TcpConnector};
use crate::observability::metrics;
use crate::proxy::handler::{handle_connection, ConnectionSettings};

/// Pause after a failed accept. Errors such as EMFILE repeat until a
/// connection closes, and retrying at once would spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// The forward proxy server.
pub struct ProxyServer<C = TcpConnector> {
    settings: Arc<ConnectionSettings>,
    connector: Arc<C>,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
}

impl ProxyServer<TcpConnector> {
    /// Create a server that reaches origins over TCP.
    pub fn new(config: &ProxyConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connect> ProxyServer<C> {
    /// Create a server that reaches origins through `connector`.
    pub fn with_connector(config: &ProxyConfig, connector: C) -> Self {
        Self {
            settings: Arc::new(ConnectionSettings::from(config)),
            connector: Arc::new(connector),
            tracker: ConnectionTracker::new(),
            drain_timeout: config.timeouts.drain(),
        }
    }

    /// Serve clients from `listener` until `shutdown` fires.
    ///
    /// Returns once every in-flight connection has finished or the drain
    /// timeout has passed.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Forward proxy accepting connections");
        }

        loop {
            let accepted = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => accepted,
            };

            let (stream, peer, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(ListenerError::Accept(e)) => {
                    back_off_after_accept_error(&e).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let guard = self.tracker.track();
            let span = tracing::info_span!("connection", id = %guard.id(), %peer);
            let settings = Arc::clone(&self.settings);
            let connector = Arc::clone(&self.connector);

            tokio::spawn(
                async move {
                    let _permit = permit;
                    let _guard = guard;
                    let started = Instant::now();
                    tracing::debug!("Client connected");

                    match handle_connection(stream, connector.as_ref(), &settings).await {
                        Ok(outcome) => metrics::record_outcome(outcome.label(), started),
                        Err(e) => {
                            tracing::warn!(error = %e, "Connection failed");
                            metrics::record_outcome(e.label(), started);
                        }
                    }
                    tracing::debug!("Client disconnected");
                }
                .instrument(span),
            );
        }

        self.drain().await;
        Ok(())
    }

    async fn drain(&self) {
        let active = self.tracker.active_count();
        if active == 0 {
            return;
        }
        tracing::info!(
            active,
            timeout_secs = self.drain_timeout.as_secs(),
            "Draining in-flight connections"
        );
        if tokio::time::timeout(self.drain_timeout, self.tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Drain timed out, abandoning connections"
            );
        }
    }
}

async fn back_off_after_accept_error(error: &io::Error) {
    tracing::warn!(
        error = %error,
        backoff_ms = ACCEPT_ERROR_BACKOFF.as_millis() as u64,
        "Accept failed"
    );
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Rejection;
    use std::future::Future;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::net::{TcpListener, TcpStream};

    struct UnusedOrigin;

    impl Connect for UnusedOrigin {
        type Stream = DuplexStream;

        fn connect(
            &self,
            _host: &str,
            _port: u16,
        ) -> impl Future<Output = io::Result<DuplexStream>> + Send {
            async { Ok(duplex(16).0) }
        }
    }

    #[tokio::test]
    async fn accept_error_pauses_before_retrying() {
        let error = io::Error::from_raw_os_error(24);
        let started = Instant::now();
        back_off_after_accept_error(&error).await;
        assert!(started.elapsed() >= ACCEPT_ERROR_BACKOFF);
    }

    #[tokio::test]
    async fn serves_with_custom_connector_until_shutdown() {
        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listener = Listener::from_listener(tcp, 4);
        let addr = listener.local_addr().unwrap();
        let server = ProxyServer::with_connector(&ProxyConfig::default(), UnusedOrigin);
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(server.run(listener, rx));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"POST http://h/ HTTP/1.0\r\n\r\n").await.unwrap();
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, Rejection::NotImplemented.as_bytes());

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
