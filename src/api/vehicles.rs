use super::{ApiError, AppState};
use crate::store::FleetState;
use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;

/// Create snapshot API router
pub fn create_vehicles_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/vehicles", get(list_vehicles))
        .with_state(state)
}

/// GET /api/vehicles - Full fleet snapshot
///
/// Returns `{ "<id>": { "lat": .., "lng": .. }, .. }`, or `{}` when no
/// vehicle has reported yet. A store failure is a 500, never an empty object.
async fn list_vehicles(State(state): State<Arc<AppState>>) -> Result<Json<FleetState>, ApiError> {
    let fleet = state.snapshots.snapshot().await?;
    Ok(Json(fleet))
}
