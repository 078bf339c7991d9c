//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/dsqi/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/dsqi/` (~/.config/dsqi/)
//! - State/Logs: `$XDG_STATE_HOME/dsqi/` (~/.local/state/dsqi/)
//!
//! Study data itself lives under the study root (see [`StudyConfig`]),
//! not in an XDG directory, because it is shared research material.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
pub(crate) fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Study location
    #[serde(default)]
    pub study: StudyConfig,

    /// Line-count tool invocation
    #[serde(default)]
    pub line_count: LineCountConfig,

    /// Time-tracking API access
    #[serde(default)]
    pub time_tracking: TimeTrackingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Study root configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StudyConfig {
    /// Directory containing `data/` and `artifacts/`.
    /// Falls back to the current directory when unset.
    pub root: Option<PathBuf>,
}

impl StudyConfig {
    /// Resolve the study root, preferring an explicit override.
    pub fn resolve_root(&self, overridden: Option<&Path>) -> PathBuf {
        overridden
            .map(Path::to_path_buf)
            .or_else(|| self.root.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Line-count tool configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LineCountConfig {
    /// Candidate command prefixes, tried in order. The source directory and
    /// `--json --quiet` are appended to each.
    #[serde(default = "default_line_count_candidates")]
    pub candidates: Vec<Vec<String>>,

    /// Per-candidate timeout in seconds
    #[serde(default = "default_line_count_timeout")]
    pub timeout_secs: u64,
}

impl Default for LineCountConfig {
    fn default() -> Self {
        Self {
            candidates: default_line_count_candidates(),
            timeout_secs: default_line_count_timeout(),
        }
    }
}

impl LineCountConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.candidates.is_empty() || self.candidates.iter().any(|c| c.is_empty()) {
            return Err(Error::Config(
                "line_count.candidates must contain at least one non-empty command".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "line_count.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_line_count_candidates() -> Vec<Vec<String>> {
    vec![
        vec!["cloc".to_string()],
        vec!["npx".to_string(), "cloc".to_string()],
    ]
}

fn default_line_count_timeout() -> u64 {
    60
}

/// Time-tracking (WakaTime) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimeTrackingConfig {
    /// Enable/disable fetching at session close
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API base URL
    #[serde(default = "default_time_tracking_api_base")]
    pub api_base: String,

    /// Credential file holding an `api_key = ...` line.
    /// Defaults to `~/.wakatime.cfg`.
    pub credentials_path: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_time_tracking_timeout")]
    pub timeout_secs: u64,
}

impl Default for TimeTrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_time_tracking_api_base(),
            credentials_path: None,
            timeout_secs: default_time_tracking_timeout(),
        }
    }
}

impl TimeTrackingConfig {
    /// Credential file location
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| home_dir().join(".wakatime.cfg"))
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            return Err(Error::Config(
                "time_tracking.api_base must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "time_tracking.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_time_tracking_api_base() -> String {
    "https://wakatime.com/api/v1".to_string()
}

fn default_time_tracking_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.line_count.validate()?;
        config.time_tracking.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/dsqi/config.toml` (~/.config/dsqi/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("dsqi").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/dsqi/` (~/.local/state/dsqi/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("dsqi")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("dsqi.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.study.root.is_none());
        assert_eq!(config.line_count.timeout_secs, 60);
        assert_eq!(config.line_count.candidates.len(), 2);
        assert_eq!(config.line_count.candidates[0], vec!["cloc".to_string()]);
        assert!(config.time_tracking.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[study]
root = "/srv/study"

[line_count]
candidates = [["tokei-cloc"]]
timeout_secs = 5

[time_tracking]
enabled = false
api_base = "http://localhost:9000/api/v1"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.study.root, Some(PathBuf::from("/srv/study")));
        assert_eq!(config.line_count.candidates, vec![vec!["tokei-cloc".to_string()]]);
        assert_eq!(config.line_count.timeout_secs, 5);
        assert!(!config.time_tracking.enabled);
        assert_eq!(config.time_tracking.timeout_secs, 30);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_resolve_root_prefers_override() {
        let study = StudyConfig {
            root: Some(PathBuf::from("/configured")),
        };
        assert_eq!(
            study.resolve_root(Some(Path::new("/cli"))),
            PathBuf::from("/cli")
        );
        assert_eq!(study.resolve_root(None), PathBuf::from("/configured"));
        assert_eq!(
            StudyConfig::default().resolve_root(None),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_line_count_validation() {
        assert!(LineCountConfig::default().validate().is_ok());

        let empty = LineCountConfig {
            candidates: vec![],
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let blank_command = LineCountConfig {
            candidates: vec![vec![]],
            ..Default::default()
        };
        assert!(blank_command.validate().is_err());

        let zero_timeout = LineCountConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_invalid_time_tracking() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[time_tracking]\ntimeout_secs = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
