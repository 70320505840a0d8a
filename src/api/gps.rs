use super::{ApiError, AppState, MessageResponse};
use crate::position::PositionReport;
use axum::{body::Bytes, extract::State, response::Json, routing::post, Router};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Create position ingest router
pub fn create_gps_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/gps", post(receive_gps))
        .with_state(state)
}

/// POST /api/gps - Ingest one position report `{id, lat, lng}`
async fn receive_gps(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    if body.len() > state.max_body_bytes {
        warn!(size = body.len(), limit = state.max_body_bytes, "GPS payload too large");
        return Err(ApiError::PayloadTooLarge);
    }

    let report = parse_report(&body)?;
    state.ingest.ingest(&report).await?;

    Ok(Json(MessageResponse::new("GPS data received and saved")))
}

/// Body must be a JSON object; anything else is invalid GPS data
fn parse_report(body: &[u8]) -> Result<PositionReport, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Malformed GPS payload");
        ApiError::InvalidGpsData(e.to_string())
    })?;

    if !value.is_object() {
        warn!("GPS payload is not a JSON object");
        return Err(ApiError::InvalidGpsData("body must be a JSON object".to_string()));
    }

    serde_json::from_value(value).map_err(|e| ApiError::InvalidGpsData(e.to_string()))
}
