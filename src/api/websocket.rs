use super::AppState;
use crate::observer::ObserverSession;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// GET /api/ws (and /) - WebSocket upgrade for map clients
///
/// Nothing is pushed on connect; clients fetch GET /api/vehicles for their
/// baseline and then receive one `{id, lat, lng}` message per change event.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(move |socket| async move {
        let session = ObserverSession::start(&state.hub, state.send_timeout);
        session.run(socket).await;
    })
}

/// Create WebSocket router
///
/// The map client connects to the host root, so the upgrade is served there
/// as well as at /api/ws.
pub fn create_ws_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/ws", get(ws_handler))
        .route("/", get(ws_handler))
        .with_state(state)
}
