//! Broker settings and their JSON loader.
//!
//! # Responsibility
//! - Hold statement, delete and connection settings with safe defaults.
//! - Load settings from JSON text or a file and validate them.
//!
//! # Invariants
//! - Missing keys take their defaults; unknown keys are rejected.
//! - `statement_timeout_ms == 0` disables the statement timeout.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerSettings {
    pub statement_timeout_ms: u64,
    /// Allows delete-by-criteria with no predicates to empty a table.
    pub allow_unfiltered_delete: bool,
    pub connect_retries: u32,
    pub retry_backoff_ms: u64,
    pub busy_timeout_ms: u64,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            statement_timeout_ms: 30_000,
            allow_unfiltered_delete: false,
            connect_retries: 3,
            retry_backoff_ms: 50,
            busy_timeout_ms: 5_000,
        }
    }
}

impl BrokerSettings {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(ConfigError::Invalid(format!(
                "retry_backoff_ms must not exceed {MAX_RETRY_BACKOFF_MS}, got {}",
                self.retry_backoff_ms
            )));
        }
        Ok(())
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        (self.statement_timeout_ms > 0).then(|| Duration::from_millis(self.statement_timeout_ms))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "malformed settings: {err}"),
            Self::Invalid(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BrokerSettings, ConfigError};
    use std::time::Duration;

    #[test]
    fn missing_keys_take_defaults() {
        let settings = BrokerSettings::from_json_str(r#"{"connect_retries": 1}"#).unwrap();
        assert_eq!(settings.connect_retries, 1);
        assert_eq!(settings.busy_timeout_ms, 5_000);
        assert_eq!(settings.statement_timeout(), Some(Duration::from_secs(30)));
        assert!(!settings.allow_unfiltered_delete);
    }

    #[test]
    fn zero_timeout_disables_statement_timeout() {
        let settings = BrokerSettings::from_json_str(r#"{"statement_timeout_ms": 0}"#).unwrap();
        assert_eq!(settings.statement_timeout(), None);
    }

    #[test]
    fn rejects_unknown_keys_and_invalid_values() {
        assert!(matches!(
            BrokerSettings::from_json_str(r#"{"statement_timeout": 10}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            BrokerSettings::from_json_str(r#"{"busy_timeout_ms": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BrokerSettings::from_json_str(r#"{"retry_backoff_ms": 60001}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = BrokerSettings::from_file("/nonexistent/entitybroker.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/entitybroker.json"));
    }
}
