//! Liveness endpoint for container platforms: `GET /health` answers `OK`.

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub fn router() -> Router {
    Router::new().route("/health", get(|| async { "OK" }))
}

/// Serve the health endpoint on `host:port` until `cancel` fires.
pub async fn serve(host: &str, port: u16, cancel: CancellationToken) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind health server on {}", addr))?;

    run(listener, cancel).await
}

pub async fn run(listener: TcpListener, cancel: CancellationToken) -> Result<()> {
    info!(addr = %listener.local_addr()?, "Health server listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .context("health server failed")
}
