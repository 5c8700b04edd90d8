//! Storage for scheduling state.
//!
//! Persistence sits behind the repository traits so backends can be swapped
//! without touching the scheduling core:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP binding / callers                                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  SchedulingService (scheduling::service)                │
//! │  - locks, working sets, algorithms                      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository) - versioned commits     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! - `repository`: trait definitions and error types
//! - `repositories::local`: in-memory implementation
//! - `factory`: repository construction from config or environment
//! - `repo_config`: `scheduler.toml` loading

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::{RepositorySettings, SchedulerConfig, SchedulingSettings};
pub use repositories::LocalRepository;
pub use repository::{
    ChangeSet, CommitRepository, ErrorContext, FullRepository, RegistrationRepository,
    RepositoryError, RepositoryResult, SessionRepository, WindowRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Initialize the global repository singleton from configuration.
pub fn init_repository(config: &SchedulerConfig) -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = RepositoryFactory::from_config(config)
        .map_err(|e| anyhow::Error::msg(e.to_string()))
        .context("Failed to create repository")?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
