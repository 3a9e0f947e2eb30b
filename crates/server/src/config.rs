// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server configuration (spec §10.5): a TOML file loaded once at startup, or
//! embedded defaults matching every numeric constant named in the spec.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("parsing {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

/// Everything the server needs to bind, authenticate, and time its
/// state machines. Deserialized with every field defaulted so a partial TOML
/// file only overrides what it mentions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Human-readable id sent in `Welcome.server_id`.
    pub server_id: String,
    /// Directory for the store's write-ahead log and the admin socket's
    /// default location. `None` runs the store purely in-memory.
    pub state_dir: Option<PathBuf>,
    /// `host:port` the agent session listener binds.
    pub session_bind: String,
    /// Admin control-plane Unix domain socket path. Defaults under `state_dir`.
    pub admin_socket: Option<PathBuf>,
    /// Directory for `tracing-appender`'s rolling file output. `None` logs to
    /// stderr only.
    pub log_dir: Option<PathBuf>,
    /// Shared secret backing [`orbitmesh_engine::StaticTokenAuthenticator`].
    /// Empty disables authentication (exit code 4 at startup, spec §6).
    pub shared_token: String,
    pub event_bus_capacity: usize,
    pub heartbeat_interval_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub ack_timeout_ms: u64,
    pub cancel_timeout_ms: u64,
    pub drain_timeout_ms: u64,
    pub retry_base_ms: u64,
    pub retry_max_backoff_ms: u64,
    /// Interval the background sweep (heartbeat reaping, ack/run timeouts,
    /// cancel-confirmation) runs at.
    pub sweep_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_id: "orbitmeshd".to_string(),
            state_dir: None,
            session_bind: "127.0.0.1:7700".to_string(),
            admin_socket: None,
            log_dir: None,
            shared_token: String::new(),
            event_bus_capacity: orbitmesh_engine::event_bus::DEFAULT_CAPACITY,
            heartbeat_interval_ms: orbitmesh_engine::registry::DEFAULT_HEARTBEAT_MS,
            heartbeat_timeout_ms: orbitmesh_engine::registry::DEFAULT_HEARTBEAT_TIMEOUT_MS,
            ack_timeout_ms: orbitmesh_engine::dispatcher::DEFAULT_ACK_TIMEOUT_MS,
            cancel_timeout_ms: orbitmesh_engine::dispatcher::DEFAULT_CANCEL_TIMEOUT_MS,
            drain_timeout_ms: orbitmesh_engine::registry::DEFAULT_DRAIN_MS,
            retry_base_ms: orbitmesh_engine::dispatcher::DEFAULT_RETRY_BASE_MS,
            retry_max_backoff_ms: orbitmesh_engine::dispatcher::DEFAULT_RETRY_MAX_BACKOFF_MS,
            sweep_interval_ms: 1_000,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default config discovery location if
    /// `path` is `None`, falling back to embedded defaults if no file exists
    /// there. A file that exists but fails to parse is always an error
    /// (exit code 2 at the `main` boundary).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = path.map(PathBuf::from).unwrap_or_else(default_config_path);
        match std::fs::read_to_string(&resolved) {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|source| ConfigError::Parse { path: resolved.clone(), source }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound && path.is_none() => {
                Ok(Config::default())
            }
            Err(source) => Err(ConfigError::Read { path: resolved, source }),
        }
    }

    pub fn state_dir(&self) -> Option<PathBuf> {
        self.state_dir.clone().or_else(default_state_dir)
    }

    pub fn admin_socket_path(&self) -> PathBuf {
        self.admin_socket.clone().unwrap_or_else(|| {
            self.state_dir().unwrap_or_else(std::env::temp_dir).join("admin.sock")
        })
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(std::env::temp_dir).join("orbitmesh").join("orbitmesh.toml")
}

fn default_state_dir() -> Option<PathBuf> {
    dirs::state_dir().or_else(dirs::data_local_dir).map(|dir| dir.join("orbitmesh"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
