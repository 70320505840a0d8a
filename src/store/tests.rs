use super::*;
use rusqlite::Connection;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn fields(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("fields must be an object"),
    }
}

fn create_test_store() -> (SqliteStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("fleet.db");
    let store = SqliteStore::open(&db_path).unwrap();
    (store, temp_dir)
}

async fn check_merge_semantics(store: &dyn EntityStore) {
    assert!(store.read_all().await.unwrap().is_empty());

    store
        .merge_upsert("v1", fields(json!({"lat": 1.0, "lng": 2.0, "driver": "ana"})))
        .await
        .unwrap();
    store
        .merge_upsert("v1", fields(json!({"lat": 1.5, "lng": 2.0})))
        .await
        .unwrap();

    let fleet = store.read_all().await.unwrap();
    assert_eq!(fleet.len(), 1);
    assert_eq!(fleet["v1"]["lat"], json!(1.5));
    assert_eq!(fleet["v1"]["lng"], json!(2.0));
    // Untouched by the second merge
    assert_eq!(fleet["v1"]["driver"], json!("ana"));
}

#[tokio::test]
async fn test_memory_store_merge_keeps_other_fields() {
    check_merge_semantics(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_sqlite_store_merge_keeps_other_fields() {
    let (store, _temp_dir) = create_test_store();
    check_merge_semantics(&store).await;
}

#[tokio::test]
async fn test_sqlite_in_memory_store() {
    let store = SqliteStore::open_in_memory().unwrap();
    check_merge_semantics(&store).await;
}

#[tokio::test]
async fn test_sqlite_store_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("fleet.db");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        store
            .merge_upsert("truck-7", fields(json!({"lat": 0.0, "lng": 0.0})))
            .await
            .unwrap();
    }

    let reopened = SqliteStore::open(&db_path).unwrap();
    let fleet = reopened.read_all().await.unwrap();
    assert_eq!(fleet["truck-7"], fields(json!({"lat": 0.0, "lng": 0.0})));
}

#[tokio::test]
async fn test_read_all_is_ordered_by_id() {
    let store = MemoryStore::new();
    for id in ["c", "a", "b"] {
        store
            .merge_upsert(id, fields(json!({"lat": 1.0, "lng": 1.0})))
            .await
            .unwrap();
    }

    let ids: Vec<String> = store.read_all().await.unwrap().into_keys().collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_sqlite_corrupt_document_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("fleet.db");

    let store = SqliteStore::open(&db_path).unwrap();
    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT INTO entities (id, document) VALUES ('bad', '[1, 2]')",
            [],
        )
        .unwrap();
    }

    let err = store.read_all().await.unwrap_err();
    assert!(matches!(err, StoreError::CorruptDocument { ref id, .. } if id == "bad"));
}

#[tokio::test]
async fn test_concurrent_merges_same_key() {
    let (store, _temp_dir) = create_test_store();
    let store = Arc::new(store);
    let mut handles = vec![];

    // Each task writes a distinct field on the same entity
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut doc = Document::new();
            doc.insert(format!("field_{}", i), json!(i));
            store.merge_upsert("shared", doc).await.unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let fleet = store.read_all().await.unwrap();
    assert_eq!(fleet["shared"].len(), 10);
}

#[test]
fn test_store_error_messages() {
    let err = StoreError::Unavailable("disk full".to_string());
    assert_eq!(err.to_string(), "entity store unavailable: disk full");
}
