//! Server configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Database path that selects the in-memory contract.
pub const IN_MEMORY: &str = ":memory:";

/// Configuration for the game service.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database path, or `:memory:` for a transient contract.
    #[serde(default = "default_database")]
    database: String,

    /// Whether `POST /accounts/{address}/fund` mints funds.
    #[serde(default)]
    faucet: bool,

    /// Timeout for client requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Balances credited on start-up.
    #[serde(default)]
    accounts: Vec<SeedAccount>,
}

/// A starting balance for one address.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, derive_new::new)]
pub struct SeedAccount {
    /// Account address.
    address: String,
    /// Balance in base units.
    balance: u64,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

#[instrument]
fn default_database() -> String {
    "stakes.db".to_string()
}

#[instrument]
fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            faucet: false,
            request_timeout_secs: default_request_timeout_secs(),
            accounts: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(database = %config.database, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Loads the file if it exists, otherwise uses defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Overrides the database path.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Enables or disables the faucet.
    pub fn with_faucet(mut self, faucet: bool) -> Self {
        self.faucet = faucet;
        self
    }

    /// True when the database path selects the in-memory contract.
    pub fn is_in_memory(&self) -> bool {
        self.database == IN_MEMORY
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Client request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert!(!config.faucet());
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_seed_accounts() {
        let config = ServerConfig::from_toml(
            r#"
            database = ":memory:"
            faucet = true

            [[accounts]]
            address = "alice"
            balance = 5000000
            "#,
        )
        .unwrap();
        assert!(config.is_in_memory());
        assert!(*config.faucet());
        assert_eq!(config.accounts(), &vec![SeedAccount::new("alice".to_string(), 5_000_000)]);
    }

    #[test]
    fn test_invalid_toml() {
        let error = ServerConfig::from_toml("port = \"eighty\"").unwrap_err();
        assert!(error.message.contains("Failed to parse config"));
    }
}
