//! Configuration management for dealerflow.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "dealerflow";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "dealerflow.db";

/// Default session file name.
const SESSION_FILE_NAME: &str = "session.json";

/// Bounds on generated invitation code length.
const INVITE_CODE_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 4..=64;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `DEALERFLOW_`)
/// 2. TOML config file at `~/.config/dealerflow/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document store configuration.
    pub store: StoreConfig,
    /// Sign-in and invitation configuration.
    pub auth: AuthConfig,
    /// Session persistence configuration.
    pub session: SessionConfig,
}

/// Document store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/dealerflow/dealerflow.db`
    pub database_path: Option<PathBuf>,
}

/// Sign-in and invitation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Emails that always sign in as superuser.
    pub superuser_emails: Vec<String>,
    /// Length of generated invitation codes.
    pub invite_code_length: usize,
}

/// Session persistence configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path to the session file.
    /// Defaults to `~/.local/share/dealerflow/session.json`
    pub session_path: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            superuser_emails: Vec::new(),
            invite_code_length: 8,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("DEALERFLOW_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !INVITE_CODE_LENGTH_RANGE.contains(&self.auth.invite_code_length) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "invite_code_length ({}) must be between {} and {}",
                    self.auth.invite_code_length,
                    INVITE_CODE_LENGTH_RANGE.start(),
                    INVITE_CODE_LENGTH_RANGE.end()
                ),
            });
        }

        for email in &self.auth.superuser_emails {
            if !email.contains('@') {
                return Err(Error::ConfigValidation {
                    message: format!("invalid superuser email: {email}"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.store
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the session file path, resolving defaults if not set.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.session
            .session_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SESSION_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.store.database_path.is_none());
        assert!(config.session.session_path.is_none());
        assert!(config.auth.superuser_emails.is_empty());
        assert_eq!(config.auth.invite_code_length, 8);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invite_code_length() {
        let mut config = Config::default();
        config.auth.invite_code_length = 2;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invite_code_length"));

        config.auth.invite_code_length = 65;
        assert!(config.validate().is_err());

        config.auth.invite_code_length = 64;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_superuser_email() {
        let mut config = Config::default();
        config.auth.superuser_emails = vec!["owner".to_string()];

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("superuser email"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("dealerflow.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.store.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_session_path_default() {
        let config = Config::default();
        assert!(config.session_path().to_string_lossy().contains("session.json"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("dealerflow"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = std::env::temp_dir().join(format!("dealerflow-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            "[auth]\nsuperuser_emails = [\"owner@lot.example\"]\ninvite_code_length = 12\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.auth.superuser_emails, vec!["owner@lot.example"]);
        assert_eq!(config.auth.invite_code_length, 12);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_auth_config_deserialize() {
        let json = r#"{"invite_code_length": 10}"#;
        let auth: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(auth.invite_code_length, 10);
        assert!(auth.superuser_emails.is_empty());
    }
}
