//! Entity store adapters.
//!
//! The store durably maps entity id -> position document. The core only needs
//! two operations: read everything, and merge-upsert one key. Both adapters
//! guarantee that merges into the same key are atomic.

mod memory;
mod sqlite;
#[cfg(test)]
mod tests;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Stored fields for one entity
pub type Document = Map<String, Value>;

/// Full fleet mapping, ordered by entity id
pub type FleetState = BTreeMap<String, Document>;

/// Durable entity id -> document store
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Read every stored entity.
    ///
    /// An empty fleet is `Ok(empty map)`; an unreachable store is an error.
    async fn read_all(&self) -> Result<FleetState, StoreError>;

    /// Merge `fields` into the document stored under `id`, creating it if absent.
    ///
    /// Fields not named in `fields` are left untouched.
    async fn merge_upsert(&self, id: &str, fields: Document) -> Result<(), StoreError>;
}

/// Store failures
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Backend could not be reached or the operation failed
    Unavailable(String),
    /// A stored document could not be decoded as a JSON object
    CorruptDocument { id: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "entity store unavailable: {}", msg),
            StoreError::CorruptDocument { id, reason } => {
                write!(f, "stored document for '{}' is corrupt: {}", id, reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Merge `fields` into `doc`, last write wins per field
pub(crate) fn merge_into(doc: &mut Document, fields: Document) {
    for (key, value) in fields {
        doc.insert(key, value);
    }
}
