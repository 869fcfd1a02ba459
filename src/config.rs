//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/outputctl/config.json`
//! (see [`default_path`]).  Every section is optional; a missing or broken
//! file falls back to the compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "log": { "path": "/home/me/outputctl.log", "filter": "debug" },
//!   "shell": { "prompt": "outputs> " }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
///
/// A minimal `{}` file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Event log settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Interactive prompt settings.
    #[serde(default)]
    pub shell: ShellConfig,
}

/// Where the event log goes and how much of it is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file.  `None` means `log.txt` in the working directory.
    pub path: Option<PathBuf>,
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            filter: "info".into(),
        }
    }
}

impl LogConfig {
    /// The configured path, or `log.txt` under `cwd`.
    pub fn resolve_path(&self, cwd: &Path) -> PathBuf {
        match &self.path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => cwd.join(p),
            None => cwd.join("log.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self { prompt: "$ ".into() }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Resolve `$XDG_CONFIG_HOME/outputctl/config.json`, falling back to
/// `$HOME/.config`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("outputctl").join("config.json")
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "log": { "path": "/var/log/outputctl.log", "filter": "debug" },
            "shell": { "prompt": "> " }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.log.path, Some(PathBuf::from("/var/log/outputctl.log")));
        assert_eq!(cfg.log.filter, "debug");
        assert_eq!(cfg.shell.prompt, "> ");
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.log.path, None);
        assert_eq!(cfg.log.filter, "info");
        assert_eq!(cfg.shell.prompt, "$ ");
    }

    #[test]
    fn deserialize_partial_log() {
        let cfg: Config = serde_json::from_str(r#"{ "log": { "filter": "trace" } }"#).unwrap();
        assert_eq!(cfg.log.filter, "trace");
        assert_eq!(cfg.log.path, None);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "shell": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn log_path_resolution() {
        let cwd = Path::new("/work");
        assert_eq!(LogConfig::default().resolve_path(cwd), PathBuf::from("/work/log.txt"));

        let relative = LogConfig {
            path: Some("logs/out.txt".into()),
            ..Default::default()
        };
        assert_eq!(relative.resolve_path(cwd), PathBuf::from("/work/logs/out.txt"));

        let absolute = LogConfig {
            path: Some("/tmp/x.log".into()),
            ..Default::default()
        };
        assert_eq!(absolute.resolve_path(cwd), PathBuf::from("/tmp/x.log"));
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join(format!("outputctl-missing-{}.json", std::process::id()));
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
