//! Web server setup and routing

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use tracing::info;

use crate::state::AppState;
use crate::ws;

/// Run the WebSocket server until the process exits.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bind = state.config.daemon.bind.clone();
    let accessories = state.registry.len();

    let app = Router::new()
        .route("/ws", get(ws::websocket_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(address = %bind, accessories, "Starting WebSocket server");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
