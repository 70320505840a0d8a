use super::*;
use crate::hub::Membership;
use crate::position::Axis;
use crate::store::{Document, FleetState, MemoryStore};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Store whose writes always fail
struct FailingStore;

#[async_trait]
impl EntityStore for FailingStore {
    async fn read_all(&self) -> Result<FleetState, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn merge_upsert(&self, _id: &str, _fields: Document) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn report(body: Value) -> PositionReport {
    serde_json::from_value(body).unwrap()
}

fn setup() -> (PositionIngest, Arc<MemoryStore>, BroadcastHub, Membership) {
    let store = Arc::new(MemoryStore::new());
    let hub = BroadcastHub::default();
    let observer = hub.join();
    let ingest = PositionIngest::new(store.clone(), hub.clone());
    (ingest, store, hub, observer)
}

#[tokio::test]
async fn test_valid_report_is_stored_and_broadcast() {
    let (ingest, store, _hub, mut observer) = setup();

    let event = ingest
        .ingest(&report(json!({"id": "v1", "lat": 1.0, "lng": 2.0})))
        .await
        .unwrap();

    assert_eq!(event.entity_id, "v1");

    let fleet = store.read_all().await.unwrap();
    assert_eq!(fleet["v1"]["lat"], json!(1.0));
    assert_eq!(fleet["v1"]["lng"], json!(2.0));

    let frame = observer.try_recv().unwrap();
    let received: ChangeEvent = serde_json::from_str(&frame).unwrap();
    assert_eq!(received, event);
}

#[tokio::test]
async fn test_zero_coordinates_ingest() {
    let (ingest, store, _hub, mut observer) = setup();

    ingest
        .ingest(&report(json!({"id": "v0", "lat": 0, "lng": 0})))
        .await
        .unwrap();

    let fleet = store.read_all().await.unwrap();
    assert_eq!(fleet["v0"]["lat"], json!(0.0));
    assert!(observer.try_recv().is_some());
}

#[tokio::test]
async fn test_invalid_reports_emit_nothing() {
    let (ingest, store, hub, mut observer) = setup();

    let bodies = [
        json!({"lat": 1.0, "lng": 2.0}),
        json!({"id": "", "lat": 1.0, "lng": 2.0}),
        json!({"id": "v1", "lng": 2.0}),
        json!({"id": "v1", "lat": 1.0}),
    ];

    for body in bodies {
        let result = ingest.ingest(&report(body)).await;
        assert!(matches!(result, Err(IngestError::Validation(_))));
    }

    assert!(store.is_empty());
    assert!(observer.try_recv().is_none());
    assert_eq!(hub.stats().events_published, 0);
}

#[tokio::test]
async fn test_validation_error_is_specific() {
    let (ingest, _store, _hub, _observer) = setup();

    let err = ingest
        .ingest(&report(json!({"id": "v1", "lat": 1.0})))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        IngestError::Validation(ValidationError::MissingCoordinate(Axis::Lng))
    );
}

#[tokio::test]
async fn test_persistence_failure_does_not_broadcast() {
    let hub = BroadcastHub::default();
    let mut observer = hub.join();
    let ingest = PositionIngest::new(Arc::new(FailingStore), hub.clone());

    let err = ingest
        .ingest(&report(json!({"id": "v1", "lat": 1.0, "lng": 2.0})))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        IngestError::Persistence(StoreError::Unavailable("connection refused".to_string()))
    );
    assert!(observer.try_recv().is_none());
    assert_eq!(hub.observer_count(), 1);
}

#[tokio::test]
async fn test_duplicate_report_yields_two_events_one_record() {
    let (ingest, store, _hub, mut observer) = setup();
    let body = json!({"id": "v1", "lat": 1.0, "lng": 2.0});

    ingest.ingest(&report(body.clone())).await.unwrap();
    ingest.ingest(&report(body)).await.unwrap();

    let fleet = store.read_all().await.unwrap();
    assert_eq!(fleet.len(), 1);
    assert_eq!(fleet["v1"], json!({"lat": 1.0, "lng": 2.0}).as_object().unwrap().clone());

    let first = observer.try_recv().unwrap();
    let second = observer.try_recv().unwrap();
    assert_eq!(first, second);
    assert!(observer.try_recv().is_none());
}

#[tokio::test]
async fn test_merge_overwrites_changed_coordinate() {
    let (ingest, store, _hub, mut observer) = setup();

    ingest
        .ingest(&report(json!({"id": "v1", "lat": 1.0, "lng": 2.0})))
        .await
        .unwrap();
    ingest
        .ingest(&report(json!({"id": "v1", "lat": 1.5, "lng": 2.0})))
        .await
        .unwrap();

    let fleet = store.read_all().await.unwrap();
    assert_eq!(fleet["v1"]["lat"], json!(1.5));
    assert_eq!(fleet["v1"]["lng"], json!(2.0));

    let lats: Vec<f64> = std::iter::from_fn(|| observer.try_recv())
        .map(|f| serde_json::from_str::<ChangeEvent>(&f).unwrap().lat)
        .collect();
    assert_eq!(lats, vec![1.0, 1.5]);
}

#[tokio::test]
async fn test_concurrent_ingests_different_entities() {
    let (ingest, store, _hub, _observer) = setup();
    let mut handles = vec![];

    for i in 0..20 {
        let ingest = ingest.clone();
        handles.push(tokio::spawn(async move {
            let body = json!({"id": format!("vehicle-{}", i), "lat": i, "lng": i});
            ingest.ingest(&report(body)).await.unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.len(), 20);
}
