//! Runtime configuration for the core crate.
//!
//! # Responsibility
//! - Carry logging settings and account-lifecycle tunables in one value.
//! - Parse that value from JSON and reject unusable settings up front.
//!
//! # Invariants
//! - `AccountConfig::history_salt` is between [`MIN_HISTORY_SALT_BYTES`] and
//!   [`MAX_HISTORY_SALT_BYTES`] long.
//! - `AccountConfig::history_limit` is never zero.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Salt used for password-history hashing when none is configured.
pub const DEFAULT_HISTORY_SALT: &str = "Pas_1Hist9";
/// Number of previous passwords kept per user.
pub const DEFAULT_HISTORY_LIMIT: u32 = 3;
/// Argon2 refuses salts shorter than this.
pub const MIN_HISTORY_SALT_BYTES: usize = 8;
/// Longest salt that still fits a base64 PHC salt field.
pub const MAX_HISTORY_SALT_BYTES: usize = 48;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level configuration consumed by embedding applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub accounts: AccountConfig,
}

impl CoreConfig {
    /// Parses and validates a JSON document. Missing keys fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.accounts.validate()
    }
}

/// File logging settings. See [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace|debug|info|warn|error.
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: String::new(),
        }
    }
}

/// Account lifecycle tunables injected into [`crate::AccountService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Fixed salt for password-history hashes. Changing it invalidates
    /// every stored history entry for reuse checks.
    pub history_salt: String,
    /// Maximum history entries kept per user.
    pub history_limit: u32,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            history_salt: DEFAULT_HISTORY_SALT.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl AccountConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_salt.len() < MIN_HISTORY_SALT_BYTES {
            return Err(ConfigError::Invalid(format!(
                "accounts.history_salt must be at least {MIN_HISTORY_SALT_BYTES} bytes"
            )));
        }
        if self.history_salt.len() > MAX_HISTORY_SALT_BYTES {
            return Err(ConfigError::Invalid(format!(
                "accounts.history_salt must be at most {MAX_HISTORY_SALT_BYTES} bytes"
            )));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "accounts.history_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AccountConfig, ConfigError, CoreConfig, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_SALT_BYTES,
    };
    use crate::password::hash_password_with_fixed_salt;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config.accounts, AccountConfig::default());
        assert_eq!(config.accounts.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn partial_accounts_section_keeps_other_defaults() {
        let config =
            CoreConfig::from_json_str(r#"{"accounts": {"history_salt": "another-salt"}}"#)
                .unwrap();
        assert_eq!(config.accounts.history_salt, "another-salt");
        assert_eq!(config.accounts.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn short_salt_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"accounts": {"history_salt": "short"}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn long_salt_is_rejected() {
        let salt = "x".repeat(MAX_HISTORY_SALT_BYTES + 1);
        let raw = format!(r#"{{"accounts": {{"history_salt": "{salt}"}}}}"#);
        let err = CoreConfig::from_json_str(&raw).unwrap_err();
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn longest_accepted_salt_still_hashes() {
        let salt = "x".repeat(MAX_HISTORY_SALT_BYTES);
        let raw = format!(r#"{{"accounts": {{"history_salt": "{salt}"}}}}"#);
        let config = CoreConfig::from_json_str(&raw).unwrap();
        hash_password_with_fixed_salt("secret", &config.accounts.history_salt).unwrap();
    }

    #[test]
    fn zero_history_limit_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"accounts": {"history_limit": 0}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("history_limit"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = CoreConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
