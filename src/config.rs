//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/layout-remote/config.json`.
//! Each concern lives under its own top-level key so the file can be
//! extended with additional sections later without breaking backward
//! compatibility.
//!
//! # Example
//!
//! ```json
//! {
//!   "connection": {
//!     "endpoint": "ws://localhost:8000",
//!     "subprotocol": "main",
//!     "poll_interval_ms": 50
//!   },
//!   "commands": {
//!     "socket_path": "/run/user/1000/layout-remote.sock"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional: a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// How to reach the layout authority.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Where the UI delivers its commands.
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// Connection to the layout authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// WebSocket URL of the authority.
    pub endpoint: String,
    /// WebSocket subprotocol to request.  `null` requests none.
    pub subprotocol: Option<String>,
    /// How long a read may block before pending sends are flushed (ms).
    pub poll_interval_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:8000".into(),
            subprotocol: Some("main".into()),
            poll_interval_ms: 50,
        }
    }
}

impl ConnectionConfig {
    pub fn poll_interval(&self) -> Duration {
        // A zero timeout would make reads block forever.
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Command socket settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Path of the Unix socket.  `null` uses
    /// `$XDG_RUNTIME_DIR/layout-remote.sock`.
    pub socket_path: Option<String>,
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
