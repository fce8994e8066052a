//! Bearer credentials for direct delivery
//!
//! Login and token storage belong to a separate subsystem; delivery only asks
//! "is there a usable token right now?".

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Environment variable that overrides stored credentials
pub const TOKEN_ENV_VAR: &str = "INTENTRA_TOKEN";

/// File name of stored credentials inside the config directory
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Source of the current bearer token.
pub trait CredentialSource: Send + Sync {
    /// A token that is present and unexpired, if any.
    fn current_token(&self) -> Option<String>;
}

/// On-disk credential record
#[derive(Debug, Clone, Deserialize)]
pub struct StoredCredentials {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.trim().is_empty() && self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// Reads `INTENTRA_TOKEN`, then `credentials.json`.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
    read_env: bool,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_env: true,
        }
    }

    pub fn in_config_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join(CREDENTIALS_FILE))
    }

    /// Ignore the environment override.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    fn load(&self) -> Option<StoredCredentials> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(creds) => Some(creds),
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable credentials"
                );
                None
            }
        }
    }
}

impl CredentialSource for FileCredentials {
    fn current_token(&self) -> Option<String> {
        if self.read_env {
            if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
                if !token.trim().is_empty() {
                    return Some(token.trim().to_string());
                }
            }
        }

        let creds = self.load()?;
        if creds.is_usable_at(Utc::now()) {
            Some(creds.access_token)
        } else {
            tracing::debug!("Stored credentials have expired");
            None
        }
    }
}

/// Fixed token, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(pub Option<String>);

impl CredentialSource for StaticCredentials {
    fn current_token(&self) -> Option<String> {
        self.0.clone()
    }
}
