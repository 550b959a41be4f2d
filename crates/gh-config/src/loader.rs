//! Configuration loader with file and environment variable support

use crate::{ClientConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "givehub.toml",
    "config.toml",
    "./config/givehub.toml",
    "/etc/givehub/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = ClientConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config);

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("GIVEHUB_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    fn apply_env_overrides(&self, config: &mut ClientConfig) {
        // API
        if let Ok(val) = env::var("GIVEHUB_API_BASE_URL") {
            config.api.base_url = val;
        }
        if let Ok(val) = env::var("GIVEHUB_API_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.api.timeout_secs = secs;
            }
        }
        if let Ok(val) = env::var("GIVEHUB_API_RETRY_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                config.api.retry_attempts = attempts;
            }
        }
        if let Ok(val) = env::var("GIVEHUB_API_RETRY_DELAY_MS") {
            if let Ok(delay) = val.parse() {
                config.api.retry_delay_ms = delay;
            }
        }

        // Storage
        if let Ok(val) = env::var("GIVEHUB_DATA_DIR") {
            config.storage.data_dir = val;
        }
        if let Ok(val) = env::var("GIVEHUB_CREDENTIALS_FILE") {
            config.storage.credentials_file = val;
        }

        // Session
        if let Ok(val) = env::var("GIVEHUB_REVERIFY_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                config.session.reverify_interval_secs = secs;
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
