//! Config file handling
//!
//! The config file uses the JSON key names the service's older tooling
//! established (`steamLoginSecure`, `gameWhiteList`), so existing files
//! keep working. The refreshed session token is written back through
//! `ConfigStore` after every successful login.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::credentials::Credentials;
use crate::error::ConfigError;
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Account name used by the login handshake
    #[serde(default)]
    pub username: String,
    /// Account password, encrypted in transit by the handshake
    #[serde(default)]
    pub password: String,
    /// Seeded session token; skips the handshake until the first expiry
    #[serde(
        rename = "steamLoginSecure",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_token: Option<String>,
    /// Entry display names to process; empty means process everything
    #[serde(rename = "gameWhiteList", default)]
    pub game_whitelist: Vec<String>,
}

impl Config {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    pub fn whitelist(&self) -> HashSet<String> {
        self.game_whitelist.iter().cloned().collect()
    }
}

/// Write-through persistence for the refreshed session token.
pub trait TokenStore: Send + Sync {
    fn persist_token(&self, token: &str) -> Result<()>;
}

/// Loads the JSON config file and writes token refreshes back to it.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: Mutex<Config>,
}

impl ConfigStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let raw = std::fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&raw)?;

        tracing::debug!(path = %path.display(), "Loaded config");

        Ok(Self {
            path,
            current: Mutex::new(config),
        })
    }

    /// Snapshot of the current config
    pub fn config(&self) -> Config {
        self.current.lock().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, config: &Config) -> Result<()> {
        let raw = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl TokenStore for ConfigStore {
    fn persist_token(&self, token: &str) -> Result<()> {
        let mut config = self.current.lock();
        config.session_token = Some(token.to_string());
        self.save(&config)?;

        tracing::info!(path = %self.path.display(), "Persisted refreshed session token");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_original_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "username": "alice",
                "password": "hunter2",
                "steamLoginSecure": "seed-token",
                "gameWhiteList": ["Game A", "Game B"]
            }"#,
        );

        let store = ConfigStore::load(&path).unwrap();
        let config = store.config();

        assert_eq!(config.username, "alice");
        assert_eq!(config.session_token.as_deref(), Some("seed-token"));
        assert!(config.whitelist().contains("Game A"));
    }

    #[test]
    fn test_missing_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"username": "alice", "password": "pw"}"#);

        let config = ConfigStore::load(&path).unwrap().config();
        assert!(config.session_token.is_none());
        assert!(config.game_whitelist.is_empty());
    }

    #[test]
    fn test_persist_token_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{"username": "alice", "password": "pw"}"#);

        let store = ConfigStore::load(&path).unwrap();
        store.persist_token("fresh-token").unwrap();

        let reloaded = ConfigStore::load(&path).unwrap().config();
        assert_eq!(reloaded.session_token.as_deref(), Some("fresh-token"));
        assert_eq!(reloaded.username, "alice");
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigStore::load("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
