//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/moneytalk/config.toml` (user config, or `MONEYTALK_CONFIG_DIR`)
//! 2. `./moneytalk.toml` (project-local)
//! 3. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::types::{APP_NAME, MoneytalkConfig};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "moneytalk.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "MONEYTALK_CONFIG_DIR";

/// Log directory name inside the config directory.
const LOG_DIR: &str = "logs";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: MoneytalkConfig,
    /// Sources that were checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Layers that failed to load.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `MONEYTALK_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = MoneytalkConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<MoneytalkConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    MoneytalkConfig::from_toml(&contents)
}

/// Save configuration to a file, creating parent directories.
pub fn save_config(config: &MoneytalkConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

/// The user config file path.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The user config directory.
///
/// Checks `MONEYTALK_CONFIG_DIR` first, then the platform default.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Where JSON log files are written.
pub fn log_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(LOG_DIR)
}

fn load_layer(config: &mut MoneytalkConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[report]
author = "Dana"
"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.report().author, "Dana");
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_project_overrides_user() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(
            user.path().join("config.toml"),
            "[report]\nauthor = \"Dana\"\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        fs::write(
            project.path().join("moneytalk.toml"),
            "[report]\nauthor = \"Sam\"\n",
        )
        .unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.config.report().author, "Sam");
        assert_eq!(loaded.config.logging().level, "warn");
        assert_eq!(loaded.loaded_from().len(), 2);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_malformed_layer_is_a_warning() {
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        fs::write(user.path().join("config.toml"), "[report\nauthor=").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.config, MoneytalkConfig::new());
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = MoneytalkConfig::new();
        config.set("storage.db_path", "/srv/journal.db").unwrap();

        save_config(&config, &path).unwrap();
        assert_eq!(load_config_file(&path).unwrap(), config);
    }

    #[test]
    fn test_log_dir() {
        assert_eq!(log_dir(Path::new("/cfg")), PathBuf::from("/cfg/logs"));
    }
}
