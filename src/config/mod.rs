//! Ambient process configuration for the control service and agents.
//!
//! Follows the pack's read-from-JSON-or-write-defaults pattern: a
//! `#[derive(Serialize, Deserialize)]` struct with a `Default` impl, read
//! from a file on disk if present and written out with default values
//! otherwise. Parsing of the richer on-disk deployment/application
//! configuration format is out of scope; this is process-level config only.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the control service process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Directory holding the persisted deployment document.
    pub data_path: String,
    /// Port the HTTP API listens on.
    pub port: u16,
    /// Port the control RPC server listens on for agent connections.
    pub agent_port: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            data_path: "./data".to_string(),
            port: 8000,
            agent_port: 4524,
        }
    }
}

impl ControlConfig {
    /// Reads `path`, creating it with default values if it doesn't exist.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_or_write_default(path)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        write_json(self, path)
    }
}

/// Configuration for an agent process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hostname or address of the control service.
    pub control_host: String,
    /// Port of the control service's RPC server.
    pub control_port: u16,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            control_host: "127.0.0.1".to_string(),
            control_port: 4524,
        }
    }
}

impl AgentConfig {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        read_or_write_default(path)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        write_json(self, path)
    }
}

fn read_or_write_default<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: Default + Serialize + for<'de> Deserialize<'de>,
{
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        }),
        Err(_) => {
            let config = T::default();
            write_json(&config, path)?;
            Ok(config)
        }
    }
}

fn write_json<T: Serialize>(config: &T, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(config).expect("config types always serialize");
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}
