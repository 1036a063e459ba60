//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::store::DATABASE_FILE;

/// Environment variable overriding the database path
pub const ENV_DATABASE: &str = "REPAIRDESK_DB";

/// Environment variable overriding the default output format
pub const ENV_FORMAT: &str = "REPAIRDESK_FORMAT";

/// repairdesk configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the inventory database
    pub database: Option<PathBuf>,

    /// Default output format (table, json, csv)
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// Command-line flags are applied on top of this by the caller.
    pub fn load() -> Self {
        let global = Self::global_config_path().and_then(|path| Self::from_file(&path));
        Self::layered(global, |key| std::env::var(key).ok())
    }

    /// Merge defaults, an optional file config and environment lookups
    fn layered(file: Option<Config>, env: impl Fn(&str) -> Option<String>) -> Self {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/repairdesk/config.yaml)
        if let Some(file) = file {
            config.merge(file);
        }

        // 3. Environment variables
        let from_env = Config {
            database: env(ENV_DATABASE)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            default_format: env(ENV_FORMAT).filter(|v| !v.trim().is_empty()),
        };
        config.merge(from_env);

        config
    }

    /// Read a YAML config file, ignoring it when missing or malformed
    fn from_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "repairdesk")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Database path, falling back to the per-user data directory
    pub fn database_path(&self) -> PathBuf {
        if let Some(ref path) = self.database {
            return path.clone();
        }

        directories::ProjectDirs::from("", "", "repairdesk")
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = Config::layered(None, env_from(&[]));
        assert_eq!(config, Config::default());
        assert!(config.database_path().ends_with(DATABASE_FILE));
    }

    #[test]
    fn test_file_values_are_used() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "database: /srv/shop/inventory.db\ndefault_format: json\n").unwrap();

        let file = Config::from_file(&path);
        let config = Config::layered(file, env_from(&[]));
        assert_eq!(config.database_path(), PathBuf::from("/srv/shop/inventory.db"));
        assert_eq!(config.default_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = Config {
            database: Some(PathBuf::from("from-file.db")),
            default_format: Some("csv".to_string()),
        };
        let config = Config::layered(
            Some(file),
            env_from(&[(ENV_DATABASE, "from-env.db"), (ENV_FORMAT, "")]),
        );
        assert_eq!(config.database, Some(PathBuf::from("from-env.db")));
        // Empty variables do not clear file values
        assert_eq!(config.default_format.as_deref(), Some("csv"));
    }

    #[test]
    fn test_malformed_or_missing_file_is_ignored() {
        let tmp = tempdir().unwrap();
        assert!(Config::from_file(&tmp.path().join("missing.yaml")).is_none());

        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "database: [unterminated").unwrap();
        assert!(Config::from_file(&path).is_none());
    }
}
