//! Minimal HTTP/1.0 forward proxy.
//!
//! Accepts `GET http://host[:port]/path` requests, forwards each one to its
//! origin as an HTTP/1.0 request and relays the response.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use forward_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use forward_proxy::lifecycle::{shutdown_signal, Shutdown};
use forward_proxy::net::Listener;
use forward_proxy::observability::{logging, metrics};
use forward_proxy::ProxyServer;

#[derive(Parser)]
#[command(name = "forward-proxy")]
#[command(about = "Minimal HTTP/1.0 forward proxy", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level, overriding `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability.log_level);
    tracing::info!("forward-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_capacity = config.buffers.request_capacity,
        response_capacity = config.buffers.response_capacity,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.trigger();
        }
    });

    let server = ProxyServer::new(&config);
    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
