//! Repository factory for dependency injection.
//!
//! Creates repository instances from runtime configuration: an explicit
//! [`RepositoryType`], the `REPOSITORY_TYPE` environment variable, or a
//! `scheduler.toml` file.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::SchedulerConfig;
use super::repositories::LocalRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string.
    ///
    /// # Arguments
    /// * `s` - String representation ("local", "memory")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" | "in-memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from the `REPOSITORY_TYPE` environment variable.
    ///
    /// Unset or unparseable values fall back to Local.
    pub fn from_env() -> Self {
        std::env::var("REPOSITORY_TYPE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::Local)
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```
/// use exam_scheduler::db::{RepositoryFactory, RepositoryType};
///
/// let repo = RepositoryFactory::create(RepositoryType::Local).unwrap();
/// # let _ = repo;
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    pub fn create(repo_type: RepositoryType) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
        }
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create repository from the `REPOSITORY_TYPE` environment variable.
    pub fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        Self::create(RepositoryType::from_env())
    }

    /// Create repository from a TOML configuration file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the scheduler.toml configuration file
    pub fn from_config_file<P: AsRef<Path>>(config_path: P) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = SchedulerConfig::from_file(config_path)?;
        Self::from_config(&config)
    }

    /// Create repository from a loaded configuration.
    ///
    /// `REPOSITORY_TYPE`, when set, overrides the file's `[repository] type`.
    pub fn from_config(config: &SchedulerConfig) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = match std::env::var("REPOSITORY_TYPE") {
            Ok(val) => RepositoryType::from_str(&val),
            Err(_) => config.repository_type(),
        }
        .map_err(|e| RepositoryError::configuration(format!("Invalid repository type: {}", e)))?;
        Self::create(repo_type)
    }
}
