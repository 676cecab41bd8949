//! Bridge service configuration.
//!
//! The service consumes a configuration directory holding two files: the
//! fabric connection configuration (opaque to this crate, handed to the
//! fabric transport as-is) and the bridge configuration described by
//! [`BridgeConfig`]. Values can be overridden through `BRIDGE__`-prefixed
//! environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{
    BackendEndpoint, ConnectOptions, DEFAULT_BACKEND_PORT, DEFAULT_QUEUE_SIZE,
    DEFAULT_THREAD_COUNT,
};

/// The name of the fabric connection configuration file.
pub const FABRIC_CONFIG_FILE: &str = "fabric.toml";

/// The name of the bridge service configuration file.
pub const BRIDGE_CONFIG_FILE: &str = "bridge.toml";

/// Top-level bridge configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct BridgeConfig {
    pub general: GeneralConfig,
    /// Backend endpoint sections, keyed by backend name.
    #[serde(default)]
    pub backend: HashMap<String, BackendConfig>,
    #[serde(default)]
    pub incoming_pool: PoolConfig,
}

/// The `[general]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// The name of the active backend; a same-named `[backend.<name>]`
    /// section must supply its endpoint.
    pub backend_name: String,
    /// Path to the fabric connection configuration, resolved relative to
    /// the configuration directory when not absolute.
    #[serde(default = "default_fabric_config")]
    pub fabric_config: String,
}

fn default_fabric_config() -> String {
    FABRIC_CONFIG_FILE.to_string()
}

/// One `[backend.<name>]` section.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub host: String,
    #[serde(default = "default_backend_port")]
    pub port: u16,
}

fn default_backend_port() -> u16 {
    DEFAULT_BACKEND_PORT
}

/// The `[incoming_pool]` section sizing the fabric's worker pool.
#[derive(Debug, Deserialize, Clone)]
pub struct PoolConfig {
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    #[serde(default = "default_thread_count")]
    pub thread_count: usize,
}

fn default_queue_size() -> usize {
    DEFAULT_QUEUE_SIZE
}

fn default_thread_count() -> usize {
    DEFAULT_THREAD_COUNT
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            thread_count: DEFAULT_THREAD_COUNT,
        }
    }
}

impl BridgeConfig {
    /// Load the bridge configuration from `config_dir`.
    ///
    /// Verifies that both configuration files are readable before parsing
    /// anything, so that a missing file fails fast with a configuration
    /// error rather than surfacing later as a connect failure.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let bridge_path = config_dir.join(BRIDGE_CONFIG_FILE);
        ensure_readable(&bridge_path, "bridge service")?;

        let settings = Config::builder()
            .add_source(File::from(bridge_path.as_path()))
            .add_source(Environment::with_prefix("BRIDGE").separator("__"))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to read configuration: {}", e)))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::configuration(format!("Invalid configuration: {}", e)))?;

        config.validate(config_dir)?;
        Ok(config)
    }

    fn validate(&self, config_dir: &Path) -> Result<()> {
        if self.general.backend_name.trim().is_empty() {
            return Err(Error::configuration(
                "A sandbox backend must be named in the service configuration",
            ));
        }
        if !self.backend.contains_key(self.general.backend_name.trim()) {
            return Err(Error::configuration(format!(
                "No [backend.{}] section found in the service configuration",
                self.general.backend_name.trim()
            )));
        }
        ensure_readable(&self.fabric_config_path(config_dir), "fabric connection")?;
        Ok(())
    }

    /// The endpoint of the active backend.
    pub fn active_backend(&self) -> Result<BackendEndpoint> {
        let name = self.general.backend_name.trim();
        let section = self
            .backend
            .get(name)
            .ok_or_else(|| Error::configuration(format!("Unknown backend '{}'", name)))?;
        Ok(BackendEndpoint::new(name, section.host.clone(), section.port))
    }

    /// The resolved path of the fabric connection configuration file.
    pub fn fabric_config_path(&self, config_dir: &Path) -> PathBuf {
        resolve_config_path(config_dir, &self.general.fabric_config)
    }

    /// The fabric connect options derived from this configuration.
    pub fn connect_options(&self, config_dir: &Path) -> ConnectOptions {
        ConnectOptions {
            config_path: self.fabric_config_path(config_dir),
            queue_size: self.incoming_pool.queue_size,
            thread_count: self.incoming_pool.thread_count,
        }
    }
}

/// Resolve a path named inside the configuration.
///
/// Paths that are not found as given and are not absolute are looked up
/// relative to the configuration directory.
pub fn resolve_config_path(config_dir: &Path, in_path: &str) -> PathBuf {
    let path = PathBuf::from(in_path);
    if !path.is_file() && path.is_relative() {
        let relative = config_dir.join(&path);
        if relative.is_file() {
            return relative;
        }
    }
    path
}

fn ensure_readable(path: &Path, label: &str) -> Result<()> {
    std::fs::File::open(path).map_err(|e| {
        Error::configuration(format!(
            "Unable to access {} configuration file {}: {}",
            label,
            path.display(),
            e
        ))
    })?;
    Ok(())
}
