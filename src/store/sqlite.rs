//! Durable entity store using SQLite.
//!
//! # Schema
//! ```sql
//! CREATE TABLE entities (
//!     id TEXT PRIMARY KEY,
//!     document TEXT NOT NULL   -- JSON object
//! );
//! ```
//!
//! # Thread Safety
//! - Connection is wrapped in a Mutex; every call runs on the blocking pool
//! - Merge is read-merge-write inside one transaction under that Mutex, so
//!   same-key merges are atomic and applied in arrival order

use super::{merge_into, Document, EntityStore, FleetState, StoreError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Creates or opens a store at `db_path`.
    ///
    /// # Returns
    /// * `Ok(SqliteStore)` - Initialized store with schema in place
    /// * `Err` - If the database cannot be opened or the schema created
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let store = Self::from_connection(conn)?;
        info!(path = %path.display(), "SQLite entity store opened");
        Ok(store)
    }

    /// Opens a private in-memory database (tests, ephemeral runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                document TEXT NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create entities table")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
            op(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

fn decode(id: &str, raw: &str) -> Result<Document, StoreError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(other) => Err(StoreError::CorruptDocument {
            id: id.to_string(),
            reason: format!("expected JSON object, found {}", other),
        }),
        Err(e) => Err(StoreError::CorruptDocument {
            id: id.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn encode(id: &str, doc: &Document) -> Result<String, StoreError> {
    serde_json::to_string(doc).map_err(|e| StoreError::CorruptDocument {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn read_all(&self) -> Result<FleetState, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, document FROM entities ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut fleet = FleetState::new();
            for row in rows {
                let (id, raw) = row?;
                let doc = decode(&id, &raw)?;
                fleet.insert(id, doc);
            }
            Ok(fleet)
        })
        .await
    }

    async fn merge_upsert(&self, id: &str, fields: Document) -> Result<(), StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT document FROM entities WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;

            let mut doc = match existing {
                Some(raw) => decode(&id, &raw)?,
                None => Document::new(),
            };
            merge_into(&mut doc, fields);

            tx.execute(
                r#"
                INSERT INTO entities (id, document) VALUES (?1, ?2)
                ON CONFLICT(id) DO UPDATE SET document = excluded.document
                "#,
                params![id, encode(&id, &doc)?],
            )?;
            tx.commit()?;

            debug!(entity_id = %id, "Entity document merged");
            Ok(())
        })
        .await
    }
}
