//! TOML-based configuration for the DevBook API
//!
//! Infrastructure settings (listen address, logging, database location and
//! the name of the environment variable holding the signing secret) live in
//! `devbook.toml`. Secrets themselves never appear in the file.
//!
//! The configuration is resolved once at startup and passed explicitly to
//! the components that need it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Overrides `server.port` when set to a valid port number.
pub const PORT_ENV: &str = "API_PORT";
/// Overrides `database.url`.
pub const DATABASE_ENV: &str = "DATABASE_PATH";

/// Something worth reporting about how the configuration was resolved.
///
/// Configuration is loaded before logging is set up, so these are returned
/// to the caller and logged once the subscriber exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNotice {
    DefaultsUsed(PathBuf),
    UnparsablePort(String),
}

impl ConfigNotice {
    pub fn log(&self) {
        match self {
            ConfigNotice::DefaultsUsed(path) => {
                info!(path = %path.display(), "config file not found, using defaults")
            }
            ConfigNotice::UnparsablePort(raw) => {
                warn!(value = %raw, "ignoring unparsable {}", PORT_ENV)
            }
        }
    }
}

/// Root configuration structure loaded from devbook.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevbookConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the token signing secret
    #[serde(default = "default_secret_key_env")]
    pub secret_key_env: String,
}

fn default_secret_key_env() -> String {
    "SECRET_KEY".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key_env: default_secret_key_env(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:` for an ephemeral database
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "./data/devbook.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl DevbookConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Like [`load`](Self::load), but falls back to defaults when the file
    /// does not exist. Parse errors are still reported.
    pub fn load_or_default<P: AsRef<Path>>(
        path: P,
    ) -> Result<(Self, Option<ConfigNotice>), ConfigError> {
        match Self::load(path.as_ref()) {
            Ok(config) => Ok((config, None)),
            Err(ConfigError::FileNotFound(path)) => {
                Ok((Self::default(), Some(ConfigNotice::DefaultsUsed(path))))
            }
            Err(e) => Err(e),
        }
    }

    /// Applies `API_PORT` and `DATABASE_PATH` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Option<ConfigNotice> {
        self.apply_overrides(
            std::env::var(PORT_ENV).ok(),
            std::env::var(DATABASE_ENV).ok(),
        )
    }

    fn apply_overrides(
        &mut self,
        port: Option<String>,
        database: Option<String>,
    ) -> Option<ConfigNotice> {
        if let Some(url) = database {
            if !url.trim().is_empty() {
                self.database.url = url;
            }
        }

        let raw = port?;
        match raw.trim().parse::<u16>() {
            Ok(port) => {
                self.server.port = port;
                None
            }
            Err(_) => Some(ConfigNotice::UnparsablePort(raw)),
        }
    }

    /// Reads the signing secret from the environment variable named by
    /// `auth.secret_key_env`.
    pub fn secret_key(&self) -> Result<Vec<u8>, ConfigError> {
        let name = &self.auth.secret_key_env;
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => Ok(value.into_bytes()),
            _ => Err(ConfigError::MissingEnvVar(name.clone())),
        }
    }

    /// Checks internal consistency and that the secret is available.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }

        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'pretty' or 'json', got '{}'",
                self.server.log_format
            )));
        }

        if self.auth.secret_key_env.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.secret_key_env cannot be empty".to_string(),
            ));
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url cannot be empty".to_string(),
            ));
        }

        self.secret_key()?;

        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
