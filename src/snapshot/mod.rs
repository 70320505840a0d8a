//! Snapshot provider: full fleet read used by observers to establish a baseline.
//!
//! A snapshot is a best-effort point-in-time read and is not atomic with the
//! delta stream. Clients converge by applying change events on top of it;
//! each event carries the full coordinate pair, so last value wins per entity.


use crate::store::{EntityStore, FleetState, StoreError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Snapshot failures
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// The store could not be read. Never reported as an empty fleet.
    StoreUnavailable(StoreError),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::StoreUnavailable(e) => write!(f, "snapshot unavailable: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Serves the full entity id -> position document mapping
#[derive(Clone)]
pub struct SnapshotProvider {
    store: Arc<dyn EntityStore>,
}

impl SnapshotProvider {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Read the whole fleet. An empty fleet is an empty map, not an error.
    pub async fn snapshot(&self) -> Result<FleetState, SnapshotError> {
        let fleet = self.store.read_all().await.map_err(|e| {
            error!(error = %e, "Failed to read fleet snapshot");
            SnapshotError::StoreUnavailable(e)
        })?;

        debug!(entities = fleet.len(), "Fleet snapshot read");
        Ok(fleet)
    }
}
