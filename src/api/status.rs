use super::AppState;
use crate::hub::HubStats;
use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;

/// Create status router
pub fn create_status_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .with_state(state)
}

/// GET /api/status - Broadcast hub counters
async fn get_status(State(state): State<Arc<AppState>>) -> Json<HubStats> {
    Json(state.hub.stats())
}
