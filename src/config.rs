// src/config.rs
//! Service configuration.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional config file (`certificates.toml` or the path in `CERT_CONFIG`)
//! 3. Environment variables prefixed `CERT_`, nested keys joined with `__`
//!    (e.g. `CERT_STORE__BACKEND=file`, `CERT_EXTRACTION__ENDPOINT=...`)

use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::services::blacklist::DEFAULT_BLACKLIST_CAPACITY;
use crate::services::history::DEFAULT_HISTORY_CAPACITY;

const DEFAULT_CONFIG_FILE: &str = "certificates";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("invalid bind_addr `{0}`")]
    BindAddr(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON file used by the `file` backend
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Provider URL; document verification is disabled when unset
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlacklistConfig {
    pub capacity: usize,
    /// Flag certificates automatically when a verification reports `DetailMismatch`
    pub flag_mismatches: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub store: StoreConfig,
    pub extraction: ExtractionConfig,
    pub history_capacity: usize,
    pub blacklist: BlacklistConfig,
    /// Issue the demo certificate at startup if it is missing
    pub seed_demo: bool,
}

impl AppConfig {
    /// Loads configuration from defaults, the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("CERT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());

        let config = defaults()?
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("CERT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_config(config)
    }

    /// Deserializes and validates an already-built configuration.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::BindAddr(self.bind_addr.clone()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.extraction.timeout_secs == 0 {
            return Err(ConfigError::Zero("extraction.timeout_secs"));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Zero("history_capacity"));
        }
        if self.blacklist.capacity == 0 {
            return Err(ConfigError::Zero("blacklist.capacity"));
        }
        Ok(())
    }
}

fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("bind_addr", "127.0.0.1:3000")?
        .set_default("store.backend", "memory")?
        .set_default("store.path", "data/certificates.json")?
        .set_default("extraction.timeout_secs", 30)?
        .set_default("history_capacity", DEFAULT_HISTORY_CAPACITY as i64)?
        .set_default("blacklist.capacity", DEFAULT_BLACKLIST_CAPACITY as i64)?
        .set_default("blacklist.flag_mismatches", true)?
        .set_default("seed_demo", false)?)
}
