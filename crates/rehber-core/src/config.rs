//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, request timeout, where the session is
//! kept, and the last email used to log in.
//!
//! Configuration is stored at `~/.config/rehber/config.json`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::api::ApiClient;
use crate::auth::credentials::DEFAULT_SERVICE_NAME;
use crate::auth::{AuthClient, FileStore, KeyValueStore, KeyringStore, MemoryStore, Session};

/// Application name used for config/data directory paths
const APP_NAME: &str = "rehber";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// API base URL used when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "REHBER_API_URL";

/// Where the session token and user are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Kept in memory only; gone when the process exits
    Memory,
}

/// Session store type produced by [`Config::open_session`].
pub type DynSession = Session<Box<dyn KeyValueStore>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub session_backend: SessionBackend,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_backend: SessionBackend::default(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(std::env::var(API_URL_ENV).ok());
    }

    fn apply_overrides(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            debug!(api_url = %url, "Using API URL from environment");
            self.api_base_url = url;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(SESSION_FILE))
    }

    /// Open the configured session store
    pub fn open_session(&self) -> Result<DynSession> {
        let storage: Box<dyn KeyValueStore> = match self.session_backend {
            SessionBackend::File => Box::new(FileStore::new(self.session_path()?)),
            SessionBackend::Keyring => Box::new(KeyringStore::new(DEFAULT_SERVICE_NAME)),
            SessionBackend::Memory => Box::new(MemoryStore::new()),
        };
        Ok(Session::new(storage))
    }

    /// Build an [`AuthClient`] over the configured API and session store
    pub fn auth_client(&self) -> Result<AuthClient<DynSession>> {
        let api = ApiClient::new(&self.api_base_url, self.request_timeout())
            .context("Failed to create HTTP client")?;
        Ok(AuthClient::new(api, Arc::new(self.open_session()?)))
    }
}
