//! Session (catalog) persistence.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{DateRange, Session, SessionKey};

/// Repository trait for session rows.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Check if the backend is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// List sessions ordered by `(date, period)`.
    ///
    /// # Arguments
    /// * `range` - Optional inclusive date bounds; `None` lists everything
    async fn list_sessions(&self, range: Option<DateRange>) -> RepositoryResult<Vec<Session>>;

    /// Fetch one session.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If no session has this key
    async fn get_session(&self, key: SessionKey) -> RepositoryResult<Session>;

    /// Insert new sessions as a unit.
    ///
    /// Fails with a validation error, inserting nothing, if any key already
    /// exists or appears twice in the input.
    async fn insert_sessions(&self, sessions: Vec<Session>) -> RepositoryResult<Vec<Session>>;
}
