//! HTTP server lifecycle: bind, serve, drain, stop.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::cors::CorsConfig;

const DEFAULT_ADDR: &str = "127.0.0.1:8090";
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub addr: SocketAddr,
    /// Ceiling on draining in-flight requests after cancellation.
    pub shutdown_timeout: Duration,
    pub cors: CorsConfig,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.parse().expect("default address is valid"),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            cors: CorsConfig::default(),
        }
    }
}

/// Serve until `cancel` fires, then stop accepting and drain in-flight
/// handlers for at most `shutdown_timeout` before giving up on them.
pub async fn serve(app: Router, options: GatewayOptions, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(options.addr)
        .await
        .with_context(|| format!("failed to bind gateway at {}", options.addr))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve gateway address")?;
    tracing::info!(addr = %local_addr, "gateway listening");

    let graceful = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                graceful.cancelled().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result
                .context("gateway server task failed")?
                .context("gateway server stopped with error")
        }
        _ = cancel.cancelled() => {
            match tokio::time::timeout(options.shutdown_timeout, &mut server).await {
                Ok(result) => result
                    .context("gateway server task failed")?
                    .context("gateway server stopped with error"),
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = options.shutdown_timeout.as_secs(),
                        "gateway graceful shutdown timed out"
                    );
                    server.abort();
                    Ok(())
                }
            }
        }
    }
}
