//! Dispatcher server configuration
//!
//! Loads and parses the dispatcher.toml configuration file with listener,
//! quality mapping and event stream settings. A missing file is not fatal:
//! the service starts on built-in defaults so a fresh checkout runs.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Server name for identification (displayed to clients)
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_server_name() -> String {
    "dispatcher-server".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8750
}

/// Quality mapping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySettings {
    /// Quality mapping YAML file
    #[serde(default = "default_mapping_path")]
    pub mapping_path: PathBuf,
    /// Directory workflow bundles live under
    #[serde(default = "default_workflows_root")]
    pub workflows_root: PathBuf,
    /// Refuse to start when any configured bundle fails validation
    #[serde(default = "default_validate_on_start")]
    pub validate_on_start: bool,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            mapping_path: default_mapping_path(),
            workflows_root: default_workflows_root(),
            validate_on_start: default_validate_on_start(),
        }
    }
}

fn default_mapping_path() -> PathBuf {
    PathBuf::from("config/quality.yaml")
}

fn default_workflows_root() -> PathBuf {
    PathBuf::from("workflows")
}

fn default_validate_on_start() -> bool {
    true
}

/// WebSocket event stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsSettings {
    /// Broadcast buffer size; clients slower than this lose events
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl Default for EventsSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

fn default_buffer_capacity() -> usize {
    256
}

/// Complete dispatcher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Quality mapping settings
    #[serde(default)]
    pub quality: QualitySettings,
    /// Event stream settings
    #[serde(default)]
    pub events: EventsSettings,
}

impl DispatcherConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadError)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::ParseError)
    }

    /// Load configuration from the default locations or environment
    ///
    /// Searches, in order:
    /// 1. CONFIG_PATH environment variable (must exist when set)
    /// 2. ./config/dispatcher.toml
    /// 3. ../config/dispatcher.toml (for development)
    /// 4. ./dispatcher.toml
    ///
    /// Falls back to built-in defaults when no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(config_path) = std::env::var("CONFIG_PATH") {
            return Self::from_file(config_path);
        }

        let paths = [
            PathBuf::from("config/dispatcher.toml"),
            PathBuf::from("../config/dispatcher.toml"),
            PathBuf::from("./dispatcher.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading configuration from {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::warn!("No dispatcher.toml found, using built-in defaults");
        Ok(Self::default())
    }

    /// Bind address with HOST and PORT environment overrides applied
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| self.server.host.clone());
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                ConfigError::InvalidConfig(format!("PORT must be a valid u16, got {raw:?}"))
            })?,
            Err(_) => self.server.port,
        };

        format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::InvalidConfig(format!("Invalid bind address: {e}")))
    }
}
