//! Runtime configuration for core consumers.
//!
//! Values come from defaults, then `BULLETIN_*` environment variables;
//! callers such as the CLI overlay their own flags afterwards.

use crate::routing::revisions::RouteRevision;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "BULLETIN_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "BULLETIN_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BULLETIN_LOG_DIR";
pub const ENV_ROUTE_REVISION: &str = "BULLETIN_ROUTE_REVISION";

const DEFAULT_DB_FILE_NAME: &str = "bulletin.sqlite3";

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file backing the announcement mirror.
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
    pub route_revision: RouteRevision,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            route_revision: RouteRevision::latest(),
        }
    }
}

impl CoreConfig {
    /// Defaults overlaid with `BULLETIN_*` variables from the process env.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = non_blank(lookup(ENV_DB_PATH)) {
            config.db_path = PathBuf::from(value);
        }
        if let Some(value) = non_blank(lookup(ENV_LOG_LEVEL)) {
            config.log_level = value;
        }
        if let Some(value) = non_blank(lookup(ENV_LOG_DIR)) {
            config.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = non_blank(lookup(ENV_ROUTE_REVISION)) {
            config.route_revision = parse_revision(&value)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        Ok(())
    }
}

/// Parses `5`, `v5` or `V5`.
pub fn parse_revision(value: &str) -> Result<RouteRevision, ConfigError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    digits
        .parse::<u8>()
        .ok()
        .and_then(RouteRevision::from_number)
        .ok_or_else(|| ConfigError::UnknownRevision(value.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyDbPath,
    RelativeLogDir(PathBuf),
    UnknownRevision(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDbPath => write!(f, "database path must not be empty"),
            Self::RelativeLogDir(path) => {
                write!(f, "log directory must be absolute: `{}`", path.display())
            }
            Self::UnknownRevision(value) => {
                write!(f, "unknown route revision `{value}`; expected 1..=5")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{
        parse_revision, ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_ROUTE_REVISION,
    };
    use crate::routing::revisions::RouteRevision;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_env() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.route_revision, RouteRevision::V5);
    }

    #[test]
    fn env_values_override_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/tmp/site.sqlite3"),
            (ENV_LOG_DIR, "/var/log/bulletin"),
            (ENV_ROUTE_REVISION, "v3"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/site.sqlite3"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/bulletin")));
        assert_eq!(config.route_revision, RouteRevision::V3);
    }

    #[test]
    fn rejects_relative_log_dir_and_unknown_revision() {
        assert_eq!(
            CoreConfig::from_lookup(lookup(&[(ENV_LOG_DIR, "logs")])).unwrap_err(),
            ConfigError::RelativeLogDir(PathBuf::from("logs"))
        );
        assert_eq!(
            parse_revision("v9").unwrap_err(),
            ConfigError::UnknownRevision("v9".to_string())
        );
        assert_eq!(parse_revision(" 2 ").unwrap(), RouteRevision::V2);
    }
}
