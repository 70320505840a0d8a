use super::{PositionReport, PositionUpdate};
use serde_json::Value;
use std::fmt;

/// Coordinate axis named in validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Lat,
    Lng,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Lat => write!(f, "lat"),
            Axis::Lng => write!(f, "lng"),
        }
    }
}

/// Validation errors for PositionReport
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingEntityId,
    InvalidEntityId(Value),
    MissingCoordinate(Axis),
    NonNumericCoordinate(Axis, Value),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingEntityId => write!(f, "id is required"),
            ValidationError::InvalidEntityId(v) => {
                write!(f, "id must be a non-empty string, got {}", v)
            }
            ValidationError::MissingCoordinate(axis) => write!(f, "{} is required", axis),
            ValidationError::NonNumericCoordinate(axis, v) => {
                write!(f, "{} must be a number, got {}", axis, v)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates a PositionReport.
///
/// Rules:
/// - id: present, a JSON string, non-empty
/// - lat/lng: present and JSON numbers (0 is valid, no range check)
/// - JSON null counts as absent
pub fn validate(report: &PositionReport) -> Result<PositionUpdate, ValidationError> {
    let entity_id = match &report.id {
        None => return Err(ValidationError::MissingEntityId),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(other) => return Err(ValidationError::InvalidEntityId(other.clone())),
    };

    let lat = coordinate(report.lat.as_ref(), Axis::Lat)?;
    let lng = coordinate(report.lng.as_ref(), Axis::Lng)?;

    Ok(PositionUpdate { entity_id, lat, lng })
}

fn coordinate(value: Option<&Value>, axis: Axis) -> Result<f64, ValidationError> {
    let value = value.ok_or(ValidationError::MissingCoordinate(axis))?;
    value
        .as_f64()
        .ok_or_else(|| ValidationError::NonNumericCoordinate(axis, value.clone()))
}
