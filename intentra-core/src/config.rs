//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/intentra/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/intentra/` (~/.config/intentra/)
//! - Data: `$XDG_DATA_HOME/intentra/` (~/.local/share/intentra/)
//! - State/Logs: `$XDG_STATE_HOME/intentra/` (~/.local/state/intentra/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default primary API endpoint for credentialed delivery.
pub const DEFAULT_API_BASE_URL: &str = "https://api.intentra.sh";

/// Environment variable that forces verbose/debug mode.
pub const DEBUG_ENV_VAR: &str = "INTENTRA_DEBUG";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Hook pipeline behaviour (debug mode, buffer location)
    #[serde(default)]
    pub hooks: HooksConfig,

    /// Primary API used when a session credential is available
    #[serde(default)]
    pub api: ApiConfig,

    /// Self-hosted server used when no session credential is available
    #[serde(default)]
    pub server: ServerConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Hook pipeline configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HooksConfig {
    /// Verbose mode: log to file and archive every scan locally
    #[serde(default)]
    pub debug: bool,

    /// Directory holding session buffers (defaults to the OS temp dir)
    pub buffer_dir: Option<PathBuf>,

    /// Minutes after which an untouched buffer is considered abandoned
    #[serde(default = "default_buffer_ttl_minutes")]
    pub buffer_ttl_minutes: u64,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            debug: false,
            buffer_dir: None,
            buffer_ttl_minutes: default_buffer_ttl_minutes(),
        }
    }
}

fn default_buffer_ttl_minutes() -> u64 {
    30
}

/// Primary API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the scan API
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Authentication mode for the self-hosted server
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Request body signed with a shared secret
    #[default]
    Hmac,
    /// Client certificate (mutual TLS)
    Mtls,
}

/// Self-hosted server configuration
///
/// Used as the fallback delivery path when no session credential is stored.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Enable/disable delivery to the self-hosted server
    #[serde(default)]
    pub enabled: bool,

    /// Server URL (e.g., `https://intentra.example.com/api/v1`)
    pub endpoint: Option<String>,

    /// Authentication mode
    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Key identifier sent alongside HMAC signatures
    pub key_id: Option<String>,

    /// HMAC shared secret
    pub secret: Option<String>,

    /// PEM client certificate (mTLS)
    pub cert_file: Option<PathBuf>,

    /// PEM private key (mTLS)
    pub key_file: Option<PathBuf>,

    /// PEM CA bundle for the server certificate (mTLS, optional)
    pub ca_file: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            auth_mode: AuthMode::default(),
            key_id: None,
            secret: None,
            cert_file: None,
            key_file: None,
            ca_file: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ServerConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.endpoint.is_none() {
            return Err(Error::Config(
                "server.endpoint is required when server is enabled".to_string(),
            ));
        }

        match self.auth_mode {
            AuthMode::Hmac => {
                if self.key_id.is_none() {
                    return Err(Error::Config(
                        "server.key_id is required for hmac auth".to_string(),
                    ));
                }
                if self.secret.is_none() {
                    return Err(Error::Config(
                        "server.secret is required for hmac auth".to_string(),
                    ));
                }
            }
            AuthMode::Mtls => {
                if self.cert_file.is_none() || self.key_file.is_none() {
                    return Err(Error::Config(
                        "server.cert_file and server.key_file are required for mtls auth"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Whether verbose mode is active (config flag or `INTENTRA_DEBUG`)
    pub fn is_debug(&self) -> bool {
        self.hooks.debug || debug_env_enabled()
    }

    /// Directory where session buffers live
    pub fn buffer_dir(&self) -> PathBuf {
        self.hooks
            .buffer_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/intentra/config.toml` (~/.config/intentra/config.toml)
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Returns the config directory (also holds stored credentials)
    pub fn config_dir() -> PathBuf {
        xdg_config_home().join("intentra")
    }

    /// Returns the data directory path (scan archive, device id)
    ///
    /// `$XDG_DATA_HOME/intentra/` (~/.local/share/intentra/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("intentra")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/intentra/` (~/.local/state/intentra/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("intentra")
    }

    /// Returns the local scan archive path
    ///
    /// `$XDG_DATA_HOME/intentra/scans.db`
    pub fn archive_path() -> PathBuf {
        Self::data_dir().join("scans.db")
    }
}

fn debug_env_enabled() -> bool {
    std::env::var(DEBUG_ENV_VAR)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.hooks.debug);
        assert_eq!(config.hooks.buffer_ttl_minutes, 30);
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert!(!config.server.enabled);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"

[hooks]
debug = true
buffer_dir = "/tmp/intentra-test"
buffer_ttl_minutes = 10

[api]
base_url = "http://localhost:8080"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.hooks.debug);
        assert_eq!(config.buffer_dir(), PathBuf::from("/tmp/intentra-test"));
        assert_eq!(config.hooks.buffer_ttl_minutes, 10);
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_server_config_validation() {
        // Disabled config is always valid
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());

        // Enabled without endpoint should fail
        let config = ServerConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        // HMAC needs key id and secret
        let config = ServerConfig {
            enabled: true,
            endpoint: Some("https://intentra.example.com".to_string()),
            key_id: Some("key-1".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            enabled: true,
            endpoint: Some("https://intentra.example.com".to_string()),
            key_id: Some("key-1".to_string()),
            secret: Some("s3cret".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_mtls_server_config() {
        let toml = r#"
[server]
enabled = true
endpoint = "https://intentra.internal"
auth_mode = "mtls"
cert_file = "/etc/intentra/client.pem"
key_file = "/etc/intentra/client.key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.auth_mode, AuthMode::Mtls);
        assert!(config.server.enabled);
        assert!(config.server.validate().is_ok());
    }
}
