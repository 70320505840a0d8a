// Position records, change events and report validation
pub mod position;

// Durable entity store adapters
pub mod store;

// Validate, persist, then broadcast
pub mod ingest;

// Full-fleet reads for observer baselines
pub mod snapshot;

// Observer membership and fan-out
pub mod hub;

// Per-connection WebSocket pump
pub mod observer;

// HTTP and WebSocket APIs
pub mod api;

// TOML + env configuration
pub mod config;
