//! Configuration module for filedock.
//!
//! The configuration is loaded once at startup and shared read-only
//! (`Arc<Config>`) with every component that needs it.

use serde::Deserialize;
use std::path::Path;

use crate::{FiledockError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL used when building public share links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// CORS allowed origins (empty allows any origin without credentials).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8008
}

fn default_public_base_url() -> String {
    "http://localhost:8008".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/filedock.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per user.
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_root() -> String {
    "data/folders".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Token and session cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// HMAC secret used to sign tokens (must be set).
    #[serde(default)]
    pub secret_key: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_expiry")]
    pub access_token_expiry_minutes: u64,
    /// Refresh token lifetime in minutes.
    #[serde(default = "default_refresh_expiry")]
    pub refresh_token_expiry_minutes: u64,
    /// Name of the refresh token cookie.
    #[serde(default = "default_cookie_name")]
    pub refresh_cookie_name: String,
    /// Domain attribute of the refresh token cookie (empty to omit).
    #[serde(default = "default_cookie_domain")]
    pub refresh_cookie_domain: String,
    /// Whether the refresh cookie carries the `Secure` attribute.
    #[serde(default = "default_cookie_secure")]
    pub refresh_cookie_secure: bool,
}

fn default_access_expiry() -> u64 {
    60
}

fn default_refresh_expiry() -> u64 {
    43200 // 30 days
}

fn default_cookie_name() -> String {
    "filedock_refresh".to_string()
}

fn default_cookie_domain() -> String {
    "localhost".to_string()
}

fn default_cookie_secure() -> bool {
    true
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            access_token_expiry_minutes: default_access_expiry(),
            refresh_token_expiry_minutes: default_refresh_expiry(),
            refresh_cookie_name: default_cookie_name(),
            refresh_cookie_domain: default_cookie_domain(),
            refresh_cookie_secure: default_cookie_secure(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filedock.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Token and cookie configuration.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FiledockError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FiledockError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEDOCK_SECRET_KEY`: token signing secret
    /// - `FILEDOCK_DATABASE_PATH`: SQLite database path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("FILEDOCK_SECRET_KEY") {
            if !secret.is_empty() {
                self.security.secret_key = secret;
            }
        }
        if let Ok(path) = std::env::var("FILEDOCK_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.security.secret_key.is_empty() {
            return Err(FiledockError::Config(
                "secret_key is not set. Set it in config.toml or via FILEDOCK_SECRET_KEY."
                    .to_string(),
            ));
        }
        if self.security.access_token_expiry_minutes == 0
            || self.security.refresh_token_expiry_minutes == 0
        {
            return Err(FiledockError::Config(
                "token expiry must be greater than zero".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(FiledockError::Config(
                "max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
