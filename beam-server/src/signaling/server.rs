use crate::{ServerConfig, SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
}

/// Runs the relay and its HTTP endpoint on an already bound listener.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let service = SignalingService::spawn(config.ice_servers);

    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Signaling relay listening on http://{}", addr);

    axum::serve(listener, router(service))
        .await
        .context("HTTP server stopped")
}
