//! Engine configuration via `scaf.toml`
//!
//! Every setting has a default, so an empty file (or no file) is a valid
//! configuration. `Engine::from_config_file` reads the file, validates it
//! and builds the engine; `write_default_if_missing` drops a commented
//! template next to the application.

use scaf_core::{ConfigError, Limits};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name looked up by applications
pub const CONFIG_FILE_NAME: &str = "scaf.toml";

/// Log levels accepted by `log_level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Engine configuration loaded from `scaf.toml`
///
/// # Example
///
/// ```toml
/// workers = 4
/// mailbox_capacity = 1024
/// max_steps_per_turn = 64
/// turn_budget_ms = 10
/// log_level = "info"
///
/// [limits]
/// max_nesting_depth = 128
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker threads; absent or `0` means one per available core
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Messages an agent's mailbox holds before posts are rejected
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,
    /// Deliveries a worker processes for one contract before re-queueing it
    #[serde(default = "default_max_steps_per_turn")]
    pub max_steps_per_turn: usize,
    /// Wall-clock budget of one turn in milliseconds
    #[serde(default = "default_turn_budget_ms")]
    pub turn_budget_ms: u64,
    /// Level used by `logging::init_from_config`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Document limits applied to submitted terms
    #[serde(default)]
    pub limits: Limits,
}

fn default_mailbox_capacity() -> usize {
    1024
}

fn default_max_steps_per_turn() -> usize {
    64
}

fn default_turn_budget_ms() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            mailbox_capacity: default_mailbox_capacity(),
            max_steps_per_turn: default_max_steps_per_turn(),
            turn_budget_ms: default_turn_budget_ms(),
            log_level: default_log_level(),
            limits: Limits::default(),
        }
    }
}

impl EngineConfig {
    /// Number of worker threads to start
    pub fn resolved_workers(&self) -> usize {
        match self.workers {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    /// Turn budget as a duration
    pub fn turn_budget(&self) -> Duration {
        Duration::from_millis(self.turn_budget_ms)
    }

    /// Check every setting
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mailbox_capacity == 0 {
            return Err(invalid("mailbox_capacity", "must be greater than 0"));
        }
        if self.max_steps_per_turn == 0 {
            return Err(invalid("max_steps_per_turn", "must be greater than 0"));
        }
        if self.turn_budget_ms == 0 {
            return Err(invalid("turn_budget_ms", "must be greater than 0"));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(invalid(
                "log_level",
                format!(
                    "'{}' is not one of {}",
                    self.log_level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }
        if self.limits.max_nesting_depth == 0 {
            return Err(invalid("limits.max_nesting_depth", "must be greater than 0"));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# SCAF engine configuration

# Worker threads (default: one per available core)
# workers = 4

# Messages an agent's mailbox holds before posts are rejected (default: 1024)
mailbox_capacity = 1024

# Deliveries processed for one contract before it goes back to the ready queue
max_steps_per_turn = 64

# Wall-clock budget of one turn in milliseconds
turn_budget_ms = 10

# One of: trace, debug, info, warn, error
log_level = "info"

# Document limits applied to submitted contract terms
[limits]
max_nesting_depth = 128
max_string_bytes = 16777216
max_sequence_len = 1000000
max_mapping_entries = 1000000
"#
    }

    /// Parse and validate config text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| ConfigError::Write {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mailbox_capacity, 1024);
        assert_eq!(config.max_steps_per_turn, 64);
        assert_eq!(config.turn_budget(), Duration::from_millis(10));
        assert!(config.resolved_workers() >= 1);
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config = EngineConfig::from_toml_str(EngineConfig::default_toml()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn empty_text_uses_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn zero_workers_means_hardware_parallelism() {
        let config = EngineConfig::from_toml_str("workers = 0").unwrap();
        assert!(config.resolved_workers() >= 1);
        let config = EngineConfig::from_toml_str("workers = 3").unwrap();
        assert_eq!(config.resolved_workers(), 3);
    }

    #[test]
    fn partial_limits_keep_other_defaults() {
        let config = EngineConfig::from_toml_str("[limits]\nmax_nesting_depth = 8\n").unwrap();
        assert_eq!(config.limits.max_nesting_depth, 8);
        assert_eq!(config.limits.max_sequence_len, Limits::default().max_sequence_len);
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = EngineConfig::from_toml_str("mailbox_capacity = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "mailbox_capacity",
                ..
            }
        ));
    }

    #[test]
    fn zero_budget_rejected() {
        assert!(EngineConfig::from_toml_str("turn_budget_ms = 0").is_err());
        assert!(EngineConfig::from_toml_str("max_steps_per_turn = 0").is_err());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let err = EngineConfig::from_toml_str("log_level = \"chatty\"").unwrap_err();
        assert!(err.to_string().contains("chatty"));
        assert!(EngineConfig::from_toml_str("log_level = \"DEBUG\"").is_ok());
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("workers = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        EngineConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        assert_eq!(EngineConfig::from_file(&path).unwrap(), EngineConfig::default());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "mailbox_capacity = 7\n").unwrap();

        EngineConfig::write_default_if_missing(&path).unwrap();
        assert_eq!(EngineConfig::from_file(&path).unwrap().mailbox_capacity, 7);
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = EngineConfig {
            workers: Some(2),
            mailbox_capacity: 16,
            max_steps_per_turn: 4,
            turn_budget_ms: 25,
            log_level: "debug".to_string(),
            limits: Limits::with_small_limits(),
        };

        config.write_to_file(&path).unwrap();
        assert_eq!(EngineConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let err = EngineConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
