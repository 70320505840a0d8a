use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod validation;

pub use validation::{validate, Axis, ValidationError};

/// Candidate position report as submitted by a producer.
///
/// Every field is optional on the wire so that an absent field can be told
/// apart from a present one. Nothing here has been validated yet.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PositionReport {
    /// Externally assigned entity identifier
    #[serde(default)]
    pub id: Option<Value>,

    #[serde(default)]
    pub lat: Option<Value>,

    #[serde(default)]
    pub lng: Option<Value>,
}

impl PositionReport {
    /// Validates the report and produces a normalized update.
    ///
    /// Returns Err(ValidationError) if the id is missing/empty or either
    /// coordinate is missing or not a number. Coordinates are not range-checked.
    pub fn validate(&self) -> Result<PositionUpdate, ValidationError> {
        validation::validate(self)
    }
}

/// A validated position for one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionUpdate {
    pub entity_id: String,
    pub lat: f64,
    pub lng: f64,
}

impl PositionUpdate {
    /// Fields merged into the entity's stored document
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("lat".to_string(), Value::from(self.lat));
        fields.insert("lng".to_string(), Value::from(self.lng));
        fields
    }

    /// Change event announcing this update to observers
    pub fn to_event(&self) -> ChangeEvent {
        ChangeEvent {
            entity_id: self.entity_id.clone(),
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Change event pushed to every connected observer.
///
/// Carries the full coordinate pair (not a diff), so applying it on top of a
/// snapshot is idempotent per entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "id")]
    pub entity_id: String,
    pub lat: f64,
    pub lng: f64,
}
