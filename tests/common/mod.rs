//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use forward_proxy::config::ProxyConfig;
use forward_proxy::http::rewrite::INJECTED_HEADERS;
use forward_proxy::net::{Listener, ListenerError};
use forward_proxy::{ProxyServer, Shutdown};

/// Start a mock origin that answers every connection with `response`.
///
/// The request head received on each connection is sent on the returned
/// channel before the response is written.
pub async fn start_mock_origin(
    response: &'static [u8],
) -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let mut request = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !request.ends_with(b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => request.extend_from_slice(&chunk[..n]),
                            }
                        }
                        let _ = tx.send(request);
                        let _ = socket.write_all(response).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// A proxy running on an ephemeral loopback port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ListenerError>>,
}

/// Default configuration bound to an ephemeral loopback port.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.listener.max_connections = 64;
    config.timeouts.drain_secs = 5;
    config
}

/// Start the proxy with `config` and serve until `shutdown` is triggered.
pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = ProxyServer::new(&config);
    let handle = tokio::spawn(server.run(listener, receiver));
    RunningProxy {
        addr,
        shutdown,
        handle,
    }
}

/// Send raw bytes to `addr` and read until the peer closes.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> io::Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(request).await?;
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await?;
    Ok(reply)
}

/// The bytes an origin receives for `head` (request line plus kept headers).
pub fn origin_request(head: &str) -> Vec<u8> {
    let mut bytes = head.as_bytes().to_vec();
    for header in INJECTED_HEADERS {
        bytes.extend_from_slice(header);
    }
    bytes.extend_from_slice(b"\r\n");
    bytes
}
