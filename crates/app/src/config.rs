use std::fmt;
use std::path::{Path, PathBuf};

pub const DB_URL_VAR: &str = "FLASHMATH_DB_URL";
pub const LOG_VAR: &str = "FLASHMATH_LOG";

const DEFAULT_DB_URL: &str = "sqlite://flashmath.sqlite3";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug)]
pub enum ConfigError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDbUrl { raw } => write!(f, "invalid database url: {raw}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime settings for the binary, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_url: String,
    pub log_filter: String,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_url = lookup(DB_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.to_string(), normalize_sqlite_url);
        let log_filter = lookup(LOG_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Self { db_url, log_filter }
    }

    /// Replace the database location with a `--db` value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDbUrl` for a blank value.
    pub fn with_db_override(mut self, raw: Option<String>) -> Result<Self, ConfigError> {
        if let Some(raw) = raw {
            if raw.trim().is_empty() {
                return Err(ConfigError::InvalidDbUrl { raw });
            }
            self.db_url = normalize_sqlite_url(raw);
        }
        Ok(self)
    }
}

/// Turn a bare path or `sqlite:` path into an absolute `sqlite://` url.
#[must_use]
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file and its directory exist before connecting.
///
/// # Errors
///
/// Returns an error for a url without a path or if the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || ConfigError::InvalidDbUrl {
        raw: db_url.to_string(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid().into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.db_url, DEFAULT_DB_URL);
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn environment_and_flag_override_defaults() {
        let config = AppConfig::from_lookup(|key| match key {
            DB_URL_VAR => Some("sqlite:///srv/flash.db".into()),
            LOG_VAR => Some("debug".into()),
            _ => None,
        });
        assert_eq!(config.db_url, "sqlite:///srv/flash.db");
        assert_eq!(config.log_filter, "debug");

        let config = config
            .with_db_override(Some("/tmp/other.sqlite3".into()))
            .unwrap();
        assert_eq!(config.db_url, "sqlite:///tmp/other.sqlite3");
        assert!(
            AppConfig::from_lookup(|_| None)
                .with_db_override(Some("  ".into()))
                .is_err()
        );
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/flash.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/flash.db"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
