use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Complete fleetsync configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

/// HTTP/WebSocket listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin
    #[serde(default)]
    pub cors_permissive: bool,
    /// Maximum accepted body size for POST /api/gps
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    16 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Entity store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Entity store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    /// SQLite database file (ignored by the memory backend)
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_store_path() -> PathBuf {
    PathBuf::from("fleetsync.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

/// Broadcast hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    /// Events buffered per observer before it is evicted as too slow
    #[serde(default = "default_observer_queue_capacity")]
    pub observer_queue_capacity: usize,
    /// Upper bound on a single WebSocket send
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

fn default_observer_queue_capacity() -> usize {
    256
}

fn default_send_timeout_ms() -> u64 {
    5000
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            observer_queue_capacity: default_observer_queue_capacity(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl FleetConfig {
    /// Apply environment overrides, ignoring values that do not parse.
    ///
    /// - `PORT`
    /// - `FLEETSYNC_STORE_BACKEND` (`sqlite` | `memory`)
    /// - `FLEETSYNC_STORE_PATH`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Some(v) = lookup("FLEETSYNC_STORE_BACKEND") {
            if let Ok(backend) = v.parse::<StoreBackend>() {
                self.store.backend = backend;
            }
        }
        if let Some(v) = lookup("FLEETSYNC_STORE_PATH") {
            if !v.is_empty() {
                self.store.path = PathBuf::from(v);
            }
        }
    }

    /// Listener address, `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<FleetConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: FleetConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Load configuration from `path` if it exists, defaults otherwise
pub fn load_config_or_default(path: &str) -> Result<FleetConfig, Box<dyn std::error::Error>> {
    if Path::new(path).exists() {
        load_config(path)
    } else {
        Ok(FleetConfig::default())
    }
}
