//! In-memory local repository implementation.
//!
//! Stores every row in memory behind a single `parking_lot::RwLock`, which
//! makes `commit` trivially atomic: the whole batch is checked and applied
//! under one write guard. Suitable for unit tests, local development and
//! single-process deployments.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    DateRange, NewRegistration, Registration, RegistrationFilter, RegistrationId,
    RegistrationStatus, RegistrationWindow, Session, SessionKey,
};
use crate::scheduling::sync::CanonicalDelta;

/// In-memory local repository.
///
/// # Example
/// ```
/// use exam_scheduler::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.session_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    window: RegistrationWindow,
    sessions: BTreeMap<SessionKey, Session>,
    registrations: BTreeMap<RegistrationId, Registration>,

    next_registration_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            window: RegistrationWindow::default(),
            sessions: BTreeMap::new(),
            registrations: BTreeMap::new(),
            next_registration_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Overwrite the stored window, bypassing the version check.
    ///
    /// Seeding helper for tests and bootstrapping.
    pub fn set_window(&self, window: RegistrationWindow) {
        self.data.write().window = window;
    }

    /// Insert or replace sessions as-is, bypassing validation.
    ///
    /// Seeding helper; lets tests set up legacy rows such as a session with
    /// `booked > capacity`.
    pub fn seed_sessions(&self, sessions: impl IntoIterator<Item = Session>) {
        let mut data = self.data.write();
        for session in sessions {
            data.sessions.insert(session.key(), session);
        }
    }

    /// Insert or replace registrations as-is, bypassing validation. The id
    /// counter moves past any seeded id.
    pub fn seed_registrations(&self, registrations: impl IntoIterator<Item = Registration>) {
        let mut data = self.data.write();
        for registration in registrations {
            data.next_registration_id = data.next_registration_id.max(registration.id.value() + 1);
            data.registrations.insert(registration.id, registration);
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn session_count(&self) -> usize {
        self.data.read().sessions.len()
    }

    pub fn registration_count(&self) -> usize {
        self.data.read().registrations.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Repository is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn conflict(entity: &str, id: impl ToString, expected: u64, found: u64) -> RepositoryError {
    RepositoryError::conflict(
        format!("{} was modified concurrently", entity),
        ErrorContext::new("commit")
            .with_entity(entity)
            .with_entity_id(id)
            .with_details(format!("expected version {}, found {}", expected, found)),
    )
}

/// Check a batch against stored state without applying anything.
fn check_changes(data: &LocalData, changes: &ChangeSet) -> RepositoryResult<()> {
    if let Some(window) = &changes.window {
        if window.version != data.window.version {
            return Err(conflict("window", "current", window.version, data.window.version));
        }
    }

    let mut seen_sessions = BTreeSet::new();
    for session in &changes.sessions {
        let key = session.key();
        if !seen_sessions.insert(key) {
            return Err(RepositoryError::validation_with_context(
                format!("Session {} appears twice in one batch", key),
                ErrorContext::new("commit").with_entity("session").with_entity_id(key),
            ));
        }
        let stored = data.sessions.get(&key).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Session {} not found", key),
                ErrorContext::new("commit").with_entity("session").with_entity_id(key),
            )
        })?;
        if stored.version != session.version {
            return Err(conflict("session", key, session.version, stored.version));
        }
    }

    let mut seen_registrations = BTreeSet::new();
    for registration in &changes.registrations {
        let id = registration.id;
        if !seen_registrations.insert(id) {
            return Err(RepositoryError::validation_with_context(
                format!("Registration {} appears twice in one batch", id),
                ErrorContext::new("commit").with_entity("registration").with_entity_id(id),
            ));
        }
        let stored = data.registrations.get(&id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Registration {} not found", id),
                ErrorContext::new("commit").with_entity("registration").with_entity_id(id),
            )
        })?;
        if stored.version != registration.version {
            return Err(conflict("registration", id, registration.version, stored.version));
        }
        if registration.status == RegistrationStatus::Assigned {
            let Some(key) = registration.assignment else {
                return Err(RepositoryError::validation_with_context(
                    format!("Registration {} is assigned without a session", id),
                    ErrorContext::new("commit").with_entity("registration").with_entity_id(id),
                ));
            };
            if !data.sessions.contains_key(&key) {
                return Err(RepositoryError::validation_with_context(
                    format!("Registration {} references unknown session {}", id, key),
                    ErrorContext::new("commit").with_entity("registration").with_entity_id(id),
                ));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl WindowRepository for LocalRepository {
    async fn get_window(&self) -> RepositoryResult<RegistrationWindow> {
        self.check_health()?;
        Ok(self.data.read().window.clone())
    }
}

#[async_trait]
impl SessionRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_sessions(&self, range: Option<DateRange>) -> RepositoryResult<Vec<Session>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .sessions
            .values()
            .filter(|s| range.map_or(true, |r| r.contains(s.date)))
            .cloned()
            .collect())
    }

    async fn get_session(&self, key: SessionKey) -> RepositoryResult<Session> {
        self.check_health()?;
        self.data.read().sessions.get(&key).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Session {} not found", key),
                ErrorContext::new("get_session").with_entity("session").with_entity_id(key),
            )
        })
    }

    async fn insert_sessions(&self, sessions: Vec<Session>) -> RepositoryResult<Vec<Session>> {
        self.check_health()?;
        let mut data = self.data.write();

        let mut seen = BTreeSet::new();
        for session in &sessions {
            let key = session.key();
            if data.sessions.contains_key(&key) || !seen.insert(key) {
                return Err(RepositoryError::validation_with_context(
                    format!("Session {} already exists", key),
                    ErrorContext::new("insert_sessions")
                        .with_entity("session")
                        .with_entity_id(key),
                ));
            }
        }

        let mut inserted = Vec::with_capacity(sessions.len());
        for mut session in sessions {
            session.version = 1;
            data.sessions.insert(session.key(), session.clone());
            inserted.push(session);
        }
        Ok(inserted)
    }
}

#[async_trait]
impl RegistrationRepository for LocalRepository {
    async fn get_registration(&self, id: RegistrationId) -> RepositoryResult<Registration> {
        self.check_health()?;
        self.data.read().registrations.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Registration {} not found", id),
                ErrorContext::new("get_registration")
                    .with_entity("registration")
                    .with_entity_id(id),
            )
        })
    }

    async fn get_registrations(&self, ids: &[RegistrationId]) -> RepositoryResult<Vec<Registration>> {
        self.check_health()?;
        let data = self.data.read();
        ids.iter()
            .map(|id| {
                data.registrations.get(id).cloned().ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("Registration {} not found", id),
                        ErrorContext::new("get_registrations")
                            .with_entity("registration")
                            .with_entity_id(id),
                    )
                })
            })
            .collect()
    }

    async fn list_registrations(&self, filter: &RegistrationFilter) -> RepositoryResult<Vec<Registration>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .registrations
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn insert_registration(&self, new: NewRegistration) -> RepositoryResult<Registration> {
        self.check_health()?;
        if new.examinee_ref.trim().is_empty() {
            return Err(RepositoryError::validation("examinee_ref is required"));
        }
        let mut data = self.data.write();
        let id = RegistrationId::new(data.next_registration_id);
        data.next_registration_id += 1;

        let mut registration = Registration::new(id, new.examinee_ref, new.registration_date);
        registration.version = 1;
        data.registrations.insert(id, registration.clone());
        Ok(registration)
    }
}

#[async_trait]
impl CommitRepository for LocalRepository {
    async fn commit(&self, changes: ChangeSet) -> RepositoryResult<CanonicalDelta> {
        self.check_health()?;
        let mut data = self.data.write();
        check_changes(&data, &changes)?;

        let mut delta = CanonicalDelta::default();
        if let Some(mut window) = changes.window {
            window.version += 1;
            data.window = window.clone();
            delta.window = Some(window);
        }
        for mut session in changes.sessions {
            session.version += 1;
            data.sessions.insert(session.key(), session.clone());
            delta.sessions.push(session);
        }
        for mut registration in changes.registrations {
            registration.version += 1;
            data.registrations.insert(registration.id, registration.clone());
            delta.registrations.push(registration);
        }
        delta.sessions.sort_by_key(Session::key);
        delta.registrations.sort_by_key(|r| r.id);
        Ok(delta)
    }
}
