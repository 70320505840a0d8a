// HTTP and WebSocket APIs

mod error;
pub mod gps;
pub mod status;
pub mod vehicles;
pub mod websocket;

pub use error::{ApiError, MessageResponse};
pub use gps::create_gps_router;
pub use status::create_status_router;
pub use vehicles::create_vehicles_router;
pub use websocket::{create_ws_router, ws_handler};

use crate::config::FleetConfig;
use crate::hub::BroadcastHub;
use crate::ingest::PositionIngest;
use crate::snapshot::SnapshotProvider;
use crate::store::EntityStore;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ingest: PositionIngest,
    pub snapshots: SnapshotProvider,
    pub hub: BroadcastHub,
    pub max_body_bytes: usize,
    pub send_timeout: Duration,
}

impl AppState {
    /// Wire ingest, snapshot and hub around one store
    pub fn new(store: Arc<dyn EntityStore>, config: &FleetConfig) -> Self {
        let hub = BroadcastHub::new(config.broadcast.observer_queue_capacity);
        Self {
            ingest: PositionIngest::new(Arc::clone(&store), hub.clone()),
            snapshots: SnapshotProvider::new(store),
            hub,
            max_body_bytes: config.server.max_body_bytes,
            send_timeout: Duration::from_millis(config.broadcast.send_timeout_ms),
        }
    }
}

/// Full application router: REST endpoints plus the realtime channel
pub fn create_app(state: Arc<AppState>, cors_permissive: bool) -> Router {
    let app = Router::new()
        .merge(create_vehicles_router(Arc::clone(&state)))
        .merge(create_gps_router(Arc::clone(&state)))
        .merge(create_status_router(Arc::clone(&state)))
        .merge(create_ws_router(state));

    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
