//! Versioned batch writes.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Registration, RegistrationWindow, Session};
use crate::scheduling::sync::CanonicalDelta;

/// A batch of writes to apply together.
///
/// Each entity carries the `version` it was read at. The batch commits only
/// if every stored row still has that version; otherwise nothing is written.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub window: Option<RegistrationWindow>,
    pub sessions: Vec<Session>,
    pub registrations: Vec<Registration>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: RegistrationWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn push_session(&mut self, session: Session) {
        self.sessions.push(session);
    }

    pub fn push_registration(&mut self, registration: Registration) {
        self.registrations.push(registration);
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_none() && self.sessions.is_empty() && self.registrations.is_empty()
    }

    /// Number of rows the batch touches.
    pub fn len(&self) -> usize {
        usize::from(self.window.is_some()) + self.sessions.len() + self.registrations.len()
    }
}

#[async_trait]
pub trait CommitRepository: Send + Sync {
    /// Apply a batch atomically.
    ///
    /// # Returns
    /// * `Ok(CanonicalDelta)` - Every written row as now stored, versions bumped
    /// * `Err(RepositoryError::Conflict)` - A row changed since it was read
    /// * `Err(RepositoryError::NotFound)` - A row in the batch does not exist
    async fn commit(&self, changes: ChangeSet) -> RepositoryResult<CanonicalDelta>;
}
