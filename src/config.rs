//! Configuration loading and generation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enable debug logging to file
    pub debug: bool,

    /// Path to log directory
    pub log_path: PathBuf,

    /// Console log filter, used when `RUST_LOG` is unset
    pub log_level: String,

    /// Version-control binary to invoke
    pub git: String,

    /// Temporary artifact, relative to the repository root
    pub temp_artifact: PathBuf,

    /// Final artifact, relative to the repository root
    pub final_artifact: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            log_path: default_log_path(),
            log_level: "info".to_string(),
            git: "git".to_string(),
            temp_artifact: PathBuf::from("tools/coach/.coaching_data"),
            final_artifact: PathBuf::from("tools/coach/coaching_data"),
        }
    }
}

/// Default log path: ~/.config/coach-learn/logs
fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("coach-learn")
        .join("logs")
}

/// Configuration service.
pub struct ConfigService;

impl ConfigService {
    /// Get the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("coach-learn")
            .join("config.toml")
    }

    /// Load configuration from file.
    ///
    /// If `path` is `None`, uses the default path.
    /// If the file doesn't exist, returns default configuration.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = path.map(PathBuf::from).unwrap_or_else(Self::default_path);
        let config_dir = path.parent();

        if !path.exists() {
            let mut config = Config::default();
            if let Some(dir) = config_dir {
                config.log_path = dir.join("logs");
            }
            return Ok(config);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // If log_path was not explicitly set, use config file's directory/logs
        if config.log_path == default_log_path()
            && let Some(dir) = config_dir
        {
            config.log_path = dir.join("logs");
        }

        Ok(config)
    }

    /// Generate default configuration file at the specified path.
    pub fn generate_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = Self::default_config_content();
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Generate default configuration content with comments.
    fn default_config_content() -> String {
        r#"# coach-learn configuration file

# Enable debug logging to file (default: false)
debug = false

# Path to log directory (default: ~/.config/coach-learn/logs)
# log_path = "~/.config/coach-learn/logs"

# Console log filter when RUST_LOG is unset (default: "info")
log_level = "info"

# Version-control binary (default: "git")
git = "git"

# Artifact locations, relative to the repository top-level directory
temp_artifact = "tools/coach/.coaching_data"
final_artifact = "tools/coach/coaching_data"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = ConfigService::default_path();
        assert!(path.ends_with("coach-learn/config.toml"));
    }

    #[test]
    fn test_generate_at_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("nested").join("dir").join("config.toml");

        ConfigService::generate_at(&config_path).unwrap();

        assert!(config_path.exists());
    }

    #[test]
    fn test_generated_file_loads_as_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        ConfigService::generate_at(&config_path).unwrap();
        let config = ConfigService::load(Some(&config_path)).unwrap();

        let defaults = Config::default();
        assert!(!config.debug);
        assert_eq!(config.git, defaults.git);
        assert_eq!(config.log_level, defaults.log_level);
        assert_eq!(config.temp_artifact, defaults.temp_artifact);
        assert_eq!(config.final_artifact, defaults.final_artifact);
        assert_eq!(config.log_path, dir.path().join("logs"));
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = ConfigService::load(Some(&config_path)).unwrap();

        assert!(!config_path.exists());
        assert!(!config.debug);
        assert_eq!(
            config.final_artifact,
            PathBuf::from("tools/coach/coaching_data")
        );
    }

    #[test]
    fn test_load_partial_config_keeps_other_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "git = \"/usr/local/bin/git\"\nfinal_artifact = \"data/cochange\"\n",
        )
        .unwrap();

        let config = ConfigService::load(Some(&config_path)).unwrap();
        assert_eq!(config.git, "/usr/local/bin/git");
        assert_eq!(config.final_artifact, PathBuf::from("data/cochange"));
        assert_eq!(
            config.temp_artifact,
            PathBuf::from("tools/coach/.coaching_data")
        );
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("bad.toml");

        fs::write(&config_path, "not valid [[[").unwrap();

        let result = ConfigService::load(Some(&config_path));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_custom_log_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "debug = true\nlog_path = \"/tmp/coach-logs\"\n",
        )
        .unwrap();

        let config = ConfigService::load(Some(&config_path)).unwrap();
        assert!(config.debug);
        assert_eq!(config.log_path, PathBuf::from("/tmp/coach-logs"));
    }
}
