//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [storage]
//! db_path = "~/journal.db"
//!
//! [logging]
//! level = "warn"
//! json_file = true
//!
//! [report]
//! author = "Dana"
//!
//! [remote]
//! endpoint = "https://config.example.com/moneytalk.json"
//! target_key = "url_3"
//! fallback_key = "url_2"
//! reachability_timeout_secs = 10
//!
//! [remote.defaults]
//! url_2 = "https://example.com/start"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Application name used for platform directories.
pub const APP_NAME: &str = "moneytalk";

/// Environment variable that overrides the database path.
pub const DB_PATH_ENV: &str = "MONEYTALK_DB_PATH";

/// Database file name inside the data directory.
const DB_FILE: &str = "journal.db";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. a project-local
/// override) can be loaded and merged section by section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneytalkConfig {
    pub storage: Option<StorageConfig>,
    pub logging: Option<LoggingConfig>,
    pub report: Option<ReportConfig>,
    pub remote: Option<RemoteConfig>,
}

impl MoneytalkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: MoneytalkConfig) {
        if other.storage.is_some() {
            self.storage = other.storage;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
        if other.report.is_some() {
            self.report = other.report;
        }
        if other.remote.is_some() {
            self.remote = other.remote;
        }
    }

    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    pub fn report(&self) -> ReportConfig {
        self.report.clone().unwrap_or_default()
    }

    pub fn remote(&self) -> RemoteConfig {
        self.remote.clone().unwrap_or_default()
    }

    /// Read a dotted key such as `report.author`. Unset optional values are `None`.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "storage.db_path" => self
                .storage()
                .db_path
                .map(|p| p.display().to_string()),
            "logging.level" => Some(self.logging().level),
            "logging.json_file" => Some(self.logging().json_file.to_string()),
            "report.author" => Some(self.report().author),
            "remote.endpoint" => self.remote().endpoint,
            "remote.target_key" => Some(self.remote().target_key),
            "remote.fallback_key" => Some(self.remote().fallback_key),
            "remote.reachability_timeout_secs" => {
                Some(self.remote().reachability_timeout_secs.to_string())
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Set a dotted key, creating its section when absent.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "storage.db_path" => {
                self.storage.get_or_insert_with(Default::default).db_path =
                    Some(PathBuf::from(value));
            }
            "logging.level" => {
                self.logging.get_or_insert_with(Default::default).level = value.to_string();
            }
            "logging.json_file" => {
                let flag = value.parse::<bool>().map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                self.logging.get_or_insert_with(Default::default).json_file = flag;
            }
            "report.author" => {
                self.report.get_or_insert_with(Default::default).author = value.to_string();
            }
            "remote.endpoint" => {
                self.remote.get_or_insert_with(Default::default).endpoint =
                    Some(value.to_string()).filter(|v| !v.is_empty());
            }
            "remote.target_key" => {
                self.remote.get_or_insert_with(Default::default).target_key = value.to_string();
            }
            "remote.fallback_key" => {
                self.remote.get_or_insert_with(Default::default).fallback_key = value.to_string();
            }
            "remote.reachability_timeout_secs" => {
                let secs = value.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                self.remote
                    .get_or_insert_with(Default::default)
                    .reachability_timeout_secs = secs;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Keys accepted by [`MoneytalkConfig::get`] and [`MoneytalkConfig::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "storage.db_path",
    "logging.level",
    "logging.json_file",
    "report.author",
    "remote.endpoint",
    "remote.target_key",
    "remote.fallback_key",
    "remote.reachability_timeout_secs",
];

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file. Default: `<data_dir>/moneytalk/journal.db`.
    pub db_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolution order:
    /// 1. `MONEYTALK_DB_PATH` environment variable
    /// 2. Configured `db_path`
    /// 3. Platform data directory
    pub fn effective_db_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var(DB_PATH_ENV)
            && !path.is_empty()
        {
            return PathBuf::from(path);
        }

        self.db_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DB_FILE)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console filter level when `RUST_LOG` is unset.
    pub level: String,
    /// Write daily-rolling JSON logs under the config directory.
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_file: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Author recorded in generated PDF reports.
    pub author: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            author: "User".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Remote
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// URL of a JSON object of string values. Remote lookups are off when unset.
    pub endpoint: Option<String>,
    /// Key holding the target URL.
    pub target_key: String,
    /// Key read from `defaults` when the endpoint is rate limiting.
    pub fallback_key: String,
    pub fetch_timeout_secs: u64,
    pub reachability_timeout_secs: u64,
    /// Values used when the remote document lacks a key.
    pub defaults: BTreeMap<String, String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            target_key: "url_3".to_string(),
            fallback_key: "url_2".to_string(),
            fetch_timeout_secs: 30,
            reachability_timeout_secs: 10,
            defaults: BTreeMap::new(),
        }
    }
}

impl RemoteConfig {
    pub fn is_enabled(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn reachability_timeout(&self) -> Duration {
        Duration::from_secs(self.reachability_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_defaults() {
        let config = MoneytalkConfig::from_toml("").unwrap();
        assert_eq!(config, MoneytalkConfig::new());
        assert_eq!(config.logging().level, "warn");
        assert_eq!(config.report().author, "User");
        let remote = config.remote();
        assert_eq!(remote.target_key, "url_3");
        assert_eq!(remote.fallback_key, "url_2");
        assert_eq!(remote.reachability_timeout(), Duration::from_secs(10));
        assert!(!remote.is_enabled());
    }

    #[test]
    fn test_parse_full_config() {
        let config = MoneytalkConfig::from_toml(
            r#"
[storage]
db_path = "/tmp/journal.db"

[report]
author = "Dana"

[remote]
endpoint = "https://config.example.com/app.json"

[remote.defaults]
url_2 = "https://example.com/fallback"
"#,
        )
        .unwrap();

        assert_eq!(
            config.storage().db_path,
            Some(PathBuf::from("/tmp/journal.db"))
        );
        assert_eq!(config.report().author, "Dana");
        let remote = config.remote();
        assert!(remote.is_enabled());
        assert_eq!(remote.target_key, "url_3");
        assert_eq!(
            remote.defaults.get("url_2").map(String::as_str),
            Some("https://example.com/fallback")
        );
    }

    #[test]
    fn test_merge_replaces_whole_sections() {
        let mut base = MoneytalkConfig::from_toml(
            r#"
[report]
author = "Dana"

[logging]
level = "debug"
"#,
        )
        .unwrap();
        let overlay = MoneytalkConfig::from_toml(
            r#"
[report]
author = "Sam"
"#,
        )
        .unwrap();

        base.merge(overlay);
        assert_eq!(base.report().author, "Sam");
        assert_eq!(base.logging().level, "debug");
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = MoneytalkConfig::new();
        config.set("report.author", "Dana").unwrap();
        config.set("remote.endpoint", "https://example.com/c.json").unwrap();

        let parsed = MoneytalkConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_get_and_set_keys() {
        let mut config = MoneytalkConfig::new();
        for key in CONFIG_KEYS {
            assert!(config.get(key).is_ok(), "{key}");
        }
        assert_eq!(config.get("remote.endpoint").unwrap(), None);

        config.set("logging.json_file", "false").unwrap();
        assert_eq!(config.get("logging.json_file").unwrap().as_deref(), Some("false"));

        config.set("remote.reachability_timeout_secs", "3").unwrap();
        assert_eq!(config.remote().reachability_timeout(), Duration::from_secs(3));

        assert!(matches!(
            config.set("remote.reachability_timeout_secs", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.get("nope.nothing"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_configured_db_path() {
        let storage = StorageConfig {
            db_path: Some(PathBuf::from("/srv/journal.db")),
        };
        if std::env::var(DB_PATH_ENV).is_err() {
            assert_eq!(storage.effective_db_path(), PathBuf::from("/srv/journal.db"));
            assert!(StorageConfig::default().effective_db_path().ends_with(DB_FILE));
        }
    }
}
