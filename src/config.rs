use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Path to the SQLite database holding the local cache and the queue
    pub database_path: PathBuf,
    /// Base URL of the remote recipe-list service
    pub server_url: String,
    /// Network round-trip budget in milliseconds before a remote call is
    /// treated as failed
    pub remote_timeout_ms: u64,
    /// Merge local and remote snapshots on read; when false the remote
    /// snapshot wins
    pub merge_on_read: bool,
    /// Maximum number of queued operations replayed per drain call
    pub queue_drain_batch_size: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            database_path: PathBuf::from(&home).join(".cooksync").join("cooksync.db"),
            server_url: "http://localhost:8080".to_string(),
            remote_timeout_ms: 5_000,
            merge_on_read: true,
            queue_drain_batch_size: 50,
        }
    }
}

impl SyncConfig {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        // Start with defaults
        let mut config = Self::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            config = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        }

        // Apply environment variable overrides
        if let Ok(db_path) = std::env::var("COOKSYNC_DATABASE_PATH") {
            config.database_path = PathBuf::from(db_path);
        }
        if let Ok(server_url) = std::env::var("COOKSYNC_SERVER_URL") {
            config.server_url = server_url;
        }
        if let Ok(timeout) = std::env::var("COOKSYNC_REMOTE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                config.remote_timeout_ms = ms;
            }
        }
        if let Ok(merge) = std::env::var("COOKSYNC_MERGE_ON_READ") {
            if let Ok(flag) = merge.parse() {
                config.merge_on_read = flag;
            }
        }
        if let Ok(batch) = std::env::var("COOKSYNC_QUEUE_DRAIN_BATCH_SIZE") {
            if let Ok(size) = batch.parse() {
                config.queue_drain_batch_size = size;
            }
        }

        Ok(config)
    }

    /// Default config file path: ~/.config/cooksync/config.yaml
    pub fn default_config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".config")
            .join("cooksync")
            .join("config.yaml")
    }

    /// Remote round-trip budget as a `Duration`.
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    e
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
