use anyhow::{anyhow, Context, Result};
use fleetsync::api::{create_app, AppState};
use fleetsync::config::{load_config_or_default, FleetConfig, StoreBackend};
use fleetsync::hub::BroadcastHub;
use fleetsync::store::{EntityStore, MemoryStore, SqliteStore};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetsync=info".into()),
        )
        .init();

    info!("fleetsync starting...");

    let config_path =
        std::env::var("FLEETSYNC_CONFIG").unwrap_or_else(|_| "fleetsync.toml".to_string());
    let mut config = load_config_or_default(&config_path)
        .map_err(|e| anyhow!("Failed to load config from {}: {}", config_path, e))?;
    config.apply_env_overrides();

    // The core cannot run without its store; fail fast
    let store = open_store(&config)?;

    let state = Arc::new(AppState::new(store, &config));
    let hub = state.hub.clone();
    let app = create_app(state, config.server.cors_permissive);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await
        .context("Server error")?;

    info!("fleetsync stopped");

    Ok(())
}

fn open_store(config: &FleetConfig) -> Result<Arc<dyn EntityStore>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&config.store.path)
                .context("Failed to initialize entity store")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory entity store; positions will not survive restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Resolves on Ctrl-C, closing every observer session first
async fn shutdown_signal(hub: BroadcastHub) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
    hub.close_all();
}
