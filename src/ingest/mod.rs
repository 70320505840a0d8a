//! Position ingest: validate, persist, then broadcast.
//!
//! The change event is handed to the hub only after the store acknowledges
//! the merge. A rejected or failed ingest never touches broadcast state.

#[cfg(test)]
mod tests;

use crate::hub::BroadcastHub;
use crate::position::{ChangeEvent, PositionReport, ValidationError};
use crate::store::{EntityStore, StoreError};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Ingest failures
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Producer sent an incomplete or malformed report
    Validation(ValidationError),
    /// Store write failed; nothing was broadcast
    Persistence(StoreError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Validation(e) => write!(f, "invalid position report: {}", e),
            IngestError::Persistence(e) => write!(f, "failed to persist position: {}", e),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<ValidationError> for IngestError {
    fn from(e: ValidationError) -> Self {
        IngestError::Validation(e)
    }
}

/// Applies producer reports to the store and announces them to observers
#[derive(Clone)]
pub struct PositionIngest {
    store: Arc<dyn EntityStore>,
    hub: BroadcastHub,
}

impl PositionIngest {
    pub fn new(store: Arc<dyn EntityStore>, hub: BroadcastHub) -> Self {
        Self { store, hub }
    }

    /// Ingest one report.
    ///
    /// Returns the change event that was published. Re-submitting the same
    /// report is safe and publishes another (identical) event.
    pub async fn ingest(&self, report: &PositionReport) -> Result<ChangeEvent, IngestError> {
        let update = report.validate().map_err(|e| {
            warn!(error = %e, "Rejected position report");
            IngestError::from(e)
        })?;

        self.store
            .merge_upsert(&update.entity_id, update.fields())
            .await
            .map_err(|e| {
                error!(entity_id = %update.entity_id, error = %e, "Failed to persist position");
                IngestError::Persistence(e)
            })?;

        let event = update.to_event();
        let delivered = self.hub.publish(&event);

        info!(
            entity_id = %event.entity_id,
            lat = event.lat,
            lng = event.lng,
            observers = delivered,
            "Position ingested"
        );

        Ok(event)
    }
}
