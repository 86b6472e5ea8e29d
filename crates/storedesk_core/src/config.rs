//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `STOREDESK_BACKEND` - `relational` (default) or `document`
//! - `STOREDESK_RELATIONAL_DB` - relational database file
//!   (default: `storedesk_relational.sqlite3`)
//! - `STOREDESK_DOCUMENT_DB` - document database file
//!   (default: `storedesk_documents.sqlite3`)
//! - `STOREDESK_LOG_LEVEL` - `trace|debug|info|warn|error`
//!   (default: `debug` in debug builds, `info` in release builds)
//! - `STOREDESK_LOG_DIR` - absolute log directory; file logging is disabled
//!   when unset
//!
//! A `.env` file in the working directory is loaded first when present.

use crate::db::BackendKind;
use crate::logging::{default_log_level, normalize_level, LoggingConfig, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_BACKEND: &str = "STOREDESK_BACKEND";
pub const ENV_RELATIONAL_DB: &str = "STOREDESK_RELATIONAL_DB";
pub const ENV_DOCUMENT_DB: &str = "STOREDESK_DOCUMENT_DB";
pub const ENV_LOG_LEVEL: &str = "STOREDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STOREDESK_LOG_DIR";

const DEFAULT_RELATIONAL_DB: &str = "storedesk_relational.sqlite3";
const DEFAULT_DOCUMENT_DB: &str = "storedesk_documents.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { key: &'static str, message: String },
    EnvFile { path: PathBuf, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => write!(f, "invalid {key}: {message}"),
            Self::EnvFile { path, message } => {
                write!(f, "failed to load `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend opened at startup.
    pub backend: BackendKind,
    pub relational_db: PathBuf,
    pub document_db: PathBuf,
    /// Normalized log level.
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        // .env is optional
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads an explicit env file, then reads the process environment.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|err| ConfigError::EnvFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match get(ENV_BACKEND) {
            Some(value) => value.parse().map_err(|message| ConfigError::InvalidValue {
                key: ENV_BACKEND,
                message,
            })?,
            None => BackendKind::Relational,
        };

        let log_level = match get(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value).map_err(|err| ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                message: err.to_string(),
            })?,
            None => default_log_level(),
        };

        Ok(Self {
            backend,
            relational_db: get(ENV_RELATIONAL_DB)
                .map_or_else(|| PathBuf::from(DEFAULT_RELATIONAL_DB), PathBuf::from),
            document_db: get(ENV_DOCUMENT_DB)
                .map_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_DB), PathBuf::from),
            log_level,
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
        })
    }

    /// Database file of the selected backend.
    pub fn database_path(&self) -> &Path {
        match self.backend {
            BackendKind::Relational => &self.relational_db,
            BackendKind::Document => &self.document_db,
        }
    }

    /// Logging settings, or `None` when no log directory is configured.
    pub fn logging(&self) -> Option<Result<LoggingConfig, LoggingError>> {
        self.log_dir
            .as_ref()
            .map(|dir| LoggingConfig::new(self.log_level, dir))
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, ENV_BACKEND, ENV_DOCUMENT_DB, ENV_LOG_LEVEL};
    use crate::db::BackendKind;
    use std::collections::HashMap;
    use std::path::Path;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_select_relational_backend() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.backend, BackendKind::Relational);
        assert_eq!(
            config.database_path(),
            Path::new("storedesk_relational.sqlite3")
        );
        assert!(config.logging().is_none());
    }

    #[test]
    fn document_backend_uses_document_path() {
        let config = config_from(&[
            (ENV_BACKEND, "document"),
            (ENV_DOCUMENT_DB, "/tmp/docs.sqlite3"),
            (ENV_LOG_LEVEL, "WARNING"),
        ])
        .unwrap();
        assert_eq!(config.backend, BackendKind::Document);
        assert_eq!(config.database_path(), Path::new("/tmp/docs.sqlite3"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[(ENV_BACKEND, "  "), (ENV_LOG_LEVEL, "")]).unwrap();
        assert_eq!(config.backend, BackendKind::Relational);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config_from(&[(ENV_BACKEND, "graph")]).unwrap_err();
        assert!(err.to_string().contains(ENV_BACKEND));

        let err = config_from(&[(ENV_LOG_LEVEL, "chatty")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key, .. } if key == ENV_LOG_LEVEL
        ));
    }
}
