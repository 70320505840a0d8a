use crate::ingest::IngestError;
use crate::snapshot::SnapshotError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// `{message}` body used by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// API error types
///
/// Details are logged where the error is raised; clients only see the
/// fixed message for each category.
#[derive(Debug)]
pub enum ApiError {
    InvalidGpsData(String),
    PayloadTooLarge,
    SaveFailed(String),
    ReadFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidGpsData(_) => (StatusCode::BAD_REQUEST, "Invalid GPS data."),
            ApiError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large."),
            ApiError::SaveFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Error saving GPS data"),
            ApiError::ReadFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error getting vehicle data")
            }
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Validation(e) => ApiError::InvalidGpsData(e.to_string()),
            IngestError::Persistence(e) => ApiError::SaveFailed(e.to_string()),
        }
    }
}

impl From<SnapshotError> for ApiError {
    fn from(e: SnapshotError) -> Self {
        ApiError::ReadFailed(e.to_string())
    }
}
