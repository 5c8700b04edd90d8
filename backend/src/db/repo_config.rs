//! Scheduler configuration file support.
//!
//! Reads `scheduler.toml`: the `[repository]` section selects the storage
//! backend and the `[scheduling]` section tunes the scheduling core. Every
//! scheduling key has a default, so an empty section (or none) is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::factory::RepositoryType;
use super::repository::RepositoryError;
use crate::scheduling::closure::OrphanPolicy;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SCHEDULER_CONFIG";

/// Scheduler configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub scheduling: SchedulingSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

/// Tunables of the scheduling core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingSettings {
    /// Capacity given to new sessions when none is supplied. Applied once at
    /// creation time.
    #[serde(default = "default_capacity")]
    pub default_capacity: u32,
    /// Whether raising a closed session's capacity above zero reopens it.
    #[serde(default = "default_reopen_on_capacity_increase")]
    pub reopen_on_capacity_increase: bool,
    /// Fate of active registrations when a date closes without a target.
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
    /// Bound on lock wait plus commit for one operation.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    /// Period of the background full refresh.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            default_capacity: default_capacity(),
            reopen_on_capacity_increase: default_reopen_on_capacity_increase(),
            orphan_policy: OrphanPolicy::default(),
            operation_timeout_ms: default_operation_timeout_ms(),
            sync_interval_secs: default_sync_interval_secs(),
        }
    }
}

impl SchedulingSettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.default_capacity == 0 {
            return Err(RepositoryError::configuration(
                "scheduling.default_capacity must be at least 1",
            ));
        }
        if self.operation_timeout_ms == 0 {
            return Err(RepositoryError::configuration(
                "scheduling.operation_timeout_ms must be positive",
            ));
        }
        if self.sync_interval_secs == 0 {
            return Err(RepositoryError::configuration(
                "scheduling.sync_interval_secs must be positive",
            ));
        }
        Ok(())
    }
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_capacity() -> u32 {
    80
}

fn default_reopen_on_capacity_increase() -> bool {
    true
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

fn default_sync_interval_secs() -> u64 {
    30
}

impl FromStr for SchedulerConfig {
    type Err = RepositoryError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: SchedulerConfig = toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.scheduling.validate()?;
        Ok(config)
    }
}

impl SchedulerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(SchedulerConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        content.parse()
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `scheduler.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("scheduler.toml"),
            PathBuf::from("backend/scheduler.toml"),
            PathBuf::from("../scheduler.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::configuration(
            "No scheduler.toml found in standard locations",
        ))
    }

    /// Resolve configuration for a process.
    ///
    /// `SCHEDULER_CONFIG` wins when set and must point at a readable file.
    /// Otherwise the default locations are searched, and built-in defaults are
    /// used when no file exists.
    pub fn load() -> Result<Self, RepositoryError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }
        match Self::from_default_location() {
            Ok(config) => Ok(config),
            Err(RepositoryError::ConfigurationError { message, .. })
                if message.starts_with("No scheduler.toml") =>
            {
                log::info!("No scheduler.toml found; using built-in defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }
}
