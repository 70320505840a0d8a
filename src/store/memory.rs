use super::{merge_into, Document, EntityStore, FleetState, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;

/// Volatile store backed by a concurrent map.
///
/// Used for tests and for running without a database file. Merges hold the
/// per-key entry lock, so same-key writes never interleave.
#[derive(Default)]
pub struct MemoryStore {
    entities: DashMap<String, Document>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
        }
    }

    /// Number of stored entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn read_all(&self) -> Result<FleetState, StoreError> {
        Ok(self
            .entities
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect())
    }

    async fn merge_upsert(&self, id: &str, fields: Document) -> Result<(), StoreError> {
        let mut doc = self.entities.entry(id.to_string()).or_default();
        merge_into(&mut doc, fields);
        Ok(())
    }
}
