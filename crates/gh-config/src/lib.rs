//! GiveHub client configuration.
//!
//! TOML-based configuration with environment variable overrides (`GIVEHUB_*`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the platform API, including the `/api` prefix
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum attempts for retryable failures
    pub retry_attempts: u32,
    /// Initial retry delay in milliseconds (doubles per attempt)
    pub retry_delay_ms: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_ms: 100,
            user_agent: format!("GiveHub-Rust-Client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for local client state
    pub data_dir: String,
    /// Credentials document file name, relative to `data_dir`
    pub credentials_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            credentials_file: "credentials.json".to_string(),
        }
    }
}

impl StorageConfig {
    /// Full path of the credentials document.
    pub fn credentials_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.credentials_file)
    }
}

/// Session behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a backend-confirmed profile stays trusted before the
    /// controller re-verifies it against the API, in seconds.
    pub reverify_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reverify_interval_secs: 300,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# GiveHub client configuration
# Environment variables (GIVEHUB_*) override these settings

[api]
base_url = "http://localhost:5000/api"
timeout_secs = 30
retry_attempts = 3
retry_delay_ms = 100

[storage]
data_dir = "./data"
credentials_file = "credentials.json"

[session]
reverify_interval_secs = 300
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = ClientConfig::default();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.session.reverify_interval_secs, 300);
        assert!(config.storage.credentials_path().ends_with("credentials.json"));
    }

    #[test]
    fn example_toml_round_trips() {
        let config: ClientConfig = toml::from_str(&ClientConfig::example_toml()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.retry_attempts, 3);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"https://api.givehub.org/api\"").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://api.givehub.org/api");
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"\"").unwrap();

        assert!(matches!(
            ClientConfig::from_file(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
