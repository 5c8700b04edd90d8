//! Scheduling service: the operations callers invoke.
//!
//! Each mutating operation follows the same shape: lock the session keys it
//! will touch, load a working set from the repository, run the pure
//! algorithm on it, and commit the modified rows as one versioned batch. The
//! lock wait, load and commit together are bounded by
//! `operation_timeout_ms`. The result always carries the [`CanonicalDelta`]
//! of what was written.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::assigner::{assign_to, check_manual_target, pick_session};
use super::catalog::ScheduleCatalog;
use super::closure::{self, ArchiveSelection, ClosureReport};
use super::clock::{Clock, SystemClock};
use super::codes::generate_session_code;
use super::error::{SchedulingError, SchedulingResult};
use super::locks::SessionLocks;
use super::reschedule::{apply_reschedule, plan_reschedule};
use super::store::RegistrationStore;
use super::sync::{CanonicalDelta, SchedulingSnapshot, SnapshotSource};
use crate::db::repo_config::SchedulingSettings;
use crate::db::repository::{
    ChangeSet, CommitRepository, FullRepository, RegistrationRepository, SessionRepository,
    WindowRepository,
};
use crate::models::{
    DateGroup, DateGroupTimes, DateRange, NewRegistration, Registration, RegistrationFilter,
    RegistrationId, RegistrationWindow, Session, SessionKey, SessionPeriod,
};

/// Result of a mutating operation plus the rows it wrote.
#[derive(Debug, Clone, Serialize)]
pub struct Mutation<T> {
    pub result: T,
    pub delta: CanonicalDelta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub registration: Registration,
    pub session: Session,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RescheduleResult {
    pub from_date: NaiveDate,
    pub target: SessionKey,
    pub moved: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveResult {
    pub archived: usize,
    pub ids: Vec<RegistrationId>,
}

/// Per-id outcome of a bulk assignment.
#[derive(Debug)]
pub struct BulkAssignItem {
    pub id: RegistrationId,
    pub result: SchedulingResult<Registration>,
}

#[derive(Debug)]
pub struct BulkAssignOutcome {
    pub target: SessionKey,
    pub items: Vec<BulkAssignItem>,
    pub delta: CanonicalDelta,
}

impl BulkAssignOutcome {
    pub fn assigned_count(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.items.len() - self.assigned_count()
    }
}

fn date_keys(date: NaiveDate) -> [SessionKey; 2] {
    SessionPeriod::ALL.map(|period| SessionKey::new(date, period))
}

fn single_day(date: NaiveDate) -> DateRange {
    DateRange::new(Some(date), Some(date))
}

fn canonical_session(
    delta: &CanonicalDelta,
    catalog: &ScheduleCatalog,
    key: SessionKey,
) -> SchedulingResult<Session> {
    match delta.session(key) {
        Some(session) => Ok(session.clone()),
        None => catalog.session(key).cloned(),
    }
}

fn canonical_registration(
    delta: &CanonicalDelta,
    store: &RegistrationStore,
    id: RegistrationId,
) -> SchedulingResult<Registration> {
    match delta.registration(id) {
        Some(registration) => Ok(registration.clone()),
        None => store.get(id).cloned(),
    }
}

pub struct SchedulingService {
    repository: Arc<dyn FullRepository>,
    clock: Arc<dyn Clock>,
    settings: SchedulingSettings,
    locks: SessionLocks,
}

impl SchedulingService {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        clock: Arc<dyn Clock>,
        settings: SchedulingSettings,
    ) -> Self {
        Self {
            repository,
            clock,
            settings,
            locks: SessionLocks::new(),
        }
    }

    pub fn with_system_clock(repository: Arc<dyn FullRepository>, settings: SchedulingSettings) -> Self {
        Self::new(repository, Arc::new(SystemClock), settings)
    }

    pub fn settings(&self) -> &SchedulingSettings {
        &self.settings
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repository
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn health_check(&self) -> SchedulingResult<bool> {
        Ok(self.repository.health_check().await?)
    }

    // ==================== Window ====================

    /// The registration window as observed today (auto-close applied).
    pub async fn get_window(&self) -> SchedulingResult<RegistrationWindow> {
        let stored = self.repository.get_window().await?;
        Ok(stored.effective(self.today()))
    }

    /// Replace the window.
    ///
    /// `window.version` must match the stored version; a stale write fails
    /// with `Conflict`.
    pub async fn set_window(
        &self,
        window: RegistrationWindow,
    ) -> SchedulingResult<Mutation<RegistrationWindow>> {
        window.validate().map_err(SchedulingError::Validation)?;
        self.bounded("set_window", async {
            let delta = self.commit("set_window", ChangeSet::new().with_window(window)).await?;
            let stored = match &delta.window {
                Some(window) => window.clone(),
                None => self.repository.get_window().await?,
            };
            Ok(Mutation {
                result: stored.effective(self.today()),
                delta,
            })
        })
        .await
    }

    // ==================== Sessions ====================

    pub async fn list_sessions(&self, range: Option<DateRange>) -> SchedulingResult<Vec<DateGroup>> {
        let catalog = ScheduleCatalog::from_sessions(self.repository.list_sessions(range).await?);
        Ok(catalog.date_groups(range))
    }

    /// Create the morning and afternoon sessions of `date`.
    pub async fn create_date_group(
        &self,
        date: NaiveDate,
        capacity: Option<u32>,
        times: Option<DateGroupTimes>,
    ) -> SchedulingResult<Mutation<DateGroup>> {
        let capacity = capacity.unwrap_or(self.settings.default_capacity);
        if capacity == 0 {
            return Err(SchedulingError::validation("session capacity must be at least 1"));
        }
        let times = times.unwrap_or_default();
        for period in SessionPeriod::ALL {
            let t = times.for_period(period);
            if t.start >= t.end {
                return Err(SchedulingError::validation(format!(
                    "{} start time {} is not before end time {}",
                    period, t.start, t.end
                )));
            }
        }
        let today = self.today();
        if date < today {
            return Err(SchedulingError::PastDate { date, today });
        }

        self.bounded("create_date_group", async {
            let _guards = self.locks.acquire(date_keys(date)).await;
            let existing = self.repository.list_sessions(Some(single_day(date))).await?;
            if !existing.is_empty() {
                return Err(SchedulingError::validation(format!(
                    "{} already has {} sessions configured",
                    date,
                    existing.len()
                )));
            }

            let sessions: Vec<Session> = date_keys(date)
                .into_iter()
                .map(|key| {
                    let t = times.for_period(key.period);
                    let mut session = Session::new(key, capacity);
                    session.start_time = t.start;
                    session.end_time = t.end;
                    session
                })
                .collect();
            let inserted = self.repository.insert_sessions(sessions).await?;
            info!("Created date group {} with capacity {} per session", date, capacity);

            Ok(Mutation {
                result: DateGroup {
                    date,
                    sessions: inserted.clone(),
                },
                delta: CanonicalDelta {
                    sessions: inserted,
                    ..Default::default()
                },
            })
        })
        .await
    }

    pub async fn set_session_capacity(
        &self,
        key: SessionKey,
        capacity: u32,
    ) -> SchedulingResult<Mutation<Session>> {
        self.bounded("set_session_capacity", async {
            let _guards = self.locks.acquire([key]).await;
            let mut catalog = self.load_sessions(&[key]).await?;
            let before = catalog.session(key)?.status;
            let after = catalog
                .set_capacity(key, capacity, self.settings.reopen_on_capacity_increase)?
                .status;
            if before != after {
                info!("Session {} status {:?} -> {:?} after capacity change", key, before, after);
            }
            self.session_mutation("set_session_capacity", &catalog, key).await
        })
        .await
    }

    /// Close a session. Closing a closed session writes nothing.
    pub async fn close_session(&self, key: SessionKey) -> SchedulingResult<Mutation<Session>> {
        self.bounded("close_session", async {
            let _guards = self.locks.acquire([key]).await;
            let mut catalog = self.load_sessions(&[key]).await?;
            catalog.close(key)?;
            self.session_mutation("close_session", &catalog, key).await
        })
        .await
    }

    pub async fn reopen_session(&self, key: SessionKey) -> SchedulingResult<Mutation<Session>> {
        self.bounded("reopen_session", async {
            let _guards = self.locks.acquire([key]).await;
            let mut catalog = self.load_sessions(&[key]).await?;
            catalog.reopen(key)?;
            self.session_mutation("reopen_session", &catalog, key).await
        })
        .await
    }

    /// Attach a freshly generated code to both sessions of `date`.
    pub async fn generate_session_code(
        &self,
        date: NaiveDate,
        exam_ref: &str,
    ) -> SchedulingResult<Mutation<String>> {
        self.bounded("generate_session_code", async {
            let keys = date_keys(date);
            let _guards = self.locks.acquire(keys).await;
            let mut catalog = self.load_sessions(&keys).await?;
            let code = generate_session_code(date, exam_ref, &Uuid::new_v4())?;
            let tagged = catalog.set_exam_code(date, &code)?;
            let delta = self
                .commit("generate_session_code", self.changes(None, &catalog, &RegistrationStore::new()))
                .await?;
            debug!("Attached code {} to {} sessions on {}", code, tagged, date);
            Ok(Mutation { result: code, delta })
        })
        .await
    }

    // ==================== Registrations ====================

    /// Create a `registered` registration. The window must be open today and
    /// contain `registration_date`.
    pub async fn register(
        &self,
        examinee_ref: &str,
        registration_date: NaiveDate,
    ) -> SchedulingResult<Mutation<Registration>> {
        let examinee_ref = examinee_ref.trim();
        if examinee_ref.is_empty() {
            return Err(SchedulingError::validation("examinee reference is required"));
        }
        let window = self.get_window().await?;
        if !window.is_open {
            return Err(SchedulingError::OutOfWindow(format!(
                "registration window for {} is closed",
                window.academic_year
            )));
        }
        if !window.contains(registration_date) {
            return Err(SchedulingError::OutOfWindow(format!(
                "registration date {} is outside the window {} to {}",
                registration_date,
                window.start_date.map_or_else(|| "open start".to_string(), |d| d.to_string()),
                window.end_date.map_or_else(|| "open end".to_string(), |d| d.to_string()),
            )));
        }

        let registration = self
            .repository
            .insert_registration(NewRegistration {
                examinee_ref: examinee_ref.to_string(),
                registration_date,
            })
            .await?;
        info!("Registered {} as registration {}", examinee_ref, registration.id);
        Ok(Mutation {
            result: registration.clone(),
            delta: CanonicalDelta {
                registrations: vec![registration],
                ..Default::default()
            },
        })
    }

    pub async fn get_registration(&self, id: RegistrationId) -> SchedulingResult<Registration> {
        Ok(self.repository.get_registration(id).await?)
    }

    pub async fn list_registrations(
        &self,
        filter: &RegistrationFilter,
    ) -> SchedulingResult<Vec<Registration>> {
        Ok(self.repository.list_registrations(filter).await?)
    }

    pub async fn complete_registration(
        &self,
        id: RegistrationId,
    ) -> SchedulingResult<Mutation<Registration>> {
        self.bounded("complete_registration", async {
            let mut store = RegistrationStore::from_registrations([self.repository.get_registration(id).await?]);
            store.complete(id)?;
            self.registration_mutation("complete_registration", &store, id).await
        })
        .await
    }

    pub async fn cancel_registration(
        &self,
        id: RegistrationId,
    ) -> SchedulingResult<Mutation<Registration>> {
        self.bounded("cancel_registration", async {
            let mut store = RegistrationStore::from_registrations([self.repository.get_registration(id).await?]);
            store.cancel(id)?;
            self.registration_mutation("cancel_registration", &store, id).await
        })
        .await
    }

    // ==================== Assignment ====================

    /// Assign a registration to the earliest valid session.
    ///
    /// The target is picked without locks, then locked and picked again on
    /// fresh state. If the second pick differs, or the registration changed in
    /// between, the call fails with `Conflict` and nothing is written.
    pub async fn assign_registration(&self, id: RegistrationId) -> SchedulingResult<Mutation<Assignment>> {
        self.bounded("assign_registration", async {
            let today = self.today();
            let window = self.get_window().await?;
            let registration = self.repository.get_registration(id).await?;
            if !registration.is_active() {
                return Err(SchedulingError::validation(format!(
                    "registration {} is {} and cannot be assigned",
                    id, registration.status
                )));
            }
            let catalog = ScheduleCatalog::from_sessions(self.repository.list_sessions(None).await?);
            let target = pick_session(&registration, &catalog, &window, today)?;

            let mut keys = vec![target];
            keys.extend(registration.assignment);
            let _guards = self.locks.acquire(keys).await;

            let fresh = self.repository.get_registration(id).await?;
            if fresh.assignment != registration.assignment || fresh.status != registration.status {
                return Err(SchedulingError::conflict(format!(
                    "registration {} changed while waiting for session {}",
                    id, target
                )));
            }
            let mut catalog = ScheduleCatalog::from_sessions(self.repository.list_sessions(None).await?);
            let repick = pick_session(&fresh, &catalog, &window, today)?;
            if repick != target {
                return Err(SchedulingError::conflict(format!(
                    "earliest session for registration {} moved from {} to {} while waiting for the lock",
                    id, target, repick
                )));
            }

            let mut store = RegistrationStore::from_registrations([fresh]);
            assign_to(&mut store, &mut catalog, id, target)?;
            self.assignment_mutation("assign_registration", &catalog, &store, id, target)
                .await
        })
        .await
    }

    /// Assign a registration to an explicit session, with every check of an
    /// automatic assignment except the pick.
    pub async fn manual_assign(
        &self,
        id: RegistrationId,
        target: SessionKey,
    ) -> SchedulingResult<Mutation<Assignment>> {
        self.bounded("manual_assign", async {
            let today = self.today();
            let window = self.get_window().await?;
            let registration = self.repository.get_registration(id).await?;

            let mut keys = vec![target];
            keys.extend(registration.assignment);
            let _guards = self.locks.acquire(keys.iter().copied()).await;

            let fresh = self.repository.get_registration(id).await?;
            if fresh.assignment != registration.assignment {
                return Err(SchedulingError::conflict(format!(
                    "registration {} was reassigned while waiting for session {}",
                    id, target
                )));
            }
            let mut catalog = self.load_sessions(&keys).await?;
            let mut store = RegistrationStore::from_registrations([fresh]);

            let held = store.get(id)?;
            if held.is_active() && held.assignment == Some(target) {
                debug!("Registration {} already holds {}", id, target);
            } else {
                check_manual_target(&catalog, &window, today, target)?;
                assign_to(&mut store, &mut catalog, id, target)?;
            }
            self.assignment_mutation("manual_assign", &catalog, &store, id, target)
                .await
        })
        .await
    }

    /// Assign many registrations to one session.
    ///
    /// Each id succeeds or fails on its own; ids are processed in the order
    /// given, so once the target fills the remaining ids fail with
    /// `NoCapacity`. The successful items are committed together.
    pub async fn bulk_assign(
        &self,
        ids: &[RegistrationId],
        target: SessionKey,
    ) -> SchedulingResult<BulkAssignOutcome> {
        if ids.is_empty() {
            return Err(SchedulingError::validation("no registrations given"));
        }
        self.bounded("bulk_assign", async {
            let today = self.today();
            let window = self.get_window().await?;

            let mut first_read = Vec::with_capacity(ids.len());
            for id in ids {
                first_read.push(self.repository.get_registration(*id).await.ok());
            }
            let mut keys = vec![target];
            keys.extend(first_read.iter().flatten().filter_map(|r| r.assignment));
            let _guards = self.locks.acquire(keys.iter().copied()).await;

            let mut catalog = self.load_sessions(&keys).await?;
            let mut store = RegistrationStore::new();
            let mut failures: Vec<Option<SchedulingError>> = Vec::with_capacity(ids.len());
            for (id, before) in ids.iter().zip(&first_read) {
                let error = match self.repository.get_registration(*id).await {
                    Err(e) => Some(SchedulingError::from(e)),
                    Ok(fresh) => match before {
                        Some(before) if before.assignment != fresh.assignment => {
                            Some(SchedulingError::conflict(format!(
                                "registration {} was reassigned while waiting for session {}",
                                id, target
                            )))
                        }
                        None => Some(SchedulingError::conflict(format!(
                            "registration {} appeared while waiting for session {}",
                            id, target
                        ))),
                        Some(_) => {
                            store.insert(fresh);
                            None
                        }
                    },
                };
                failures.push(error);
            }

            for (id, failure) in ids.iter().zip(failures.iter_mut()) {
                if failure.is_some() {
                    continue;
                }
                let held = store.get(*id)?;
                if held.is_active() && held.assignment == Some(target) {
                    continue;
                }
                let attempt = check_manual_target(&catalog, &window, today, target)
                    .and_then(|_| assign_to(&mut store, &mut catalog, *id, target));
                if let Err(e) = attempt {
                    *failure = Some(e);
                }
            }

            let delta = self
                .commit("bulk_assign", self.changes(None, &catalog, &store))
                .await?;

            let items: Vec<BulkAssignItem> = ids
                .iter()
                .zip(failures)
                .map(|(id, failure)| BulkAssignItem {
                    id: *id,
                    result: match failure {
                        Some(e) => Err(e),
                        None => canonical_registration(&delta, &store, *id),
                    },
                })
                .collect();
            let outcome = BulkAssignOutcome {
                target,
                items,
                delta,
            };
            info!(
                "Bulk assignment to {}: {} assigned, {} failed",
                target,
                outcome.assigned_count(),
                outcome.failed_count()
            );
            Ok(outcome)
        })
        .await
    }

    // ==================== Reschedule and closure ====================

    /// Move every active registration on `from_date` to `target`, all or none.
    pub async fn reschedule(
        &self,
        from_date: NaiveDate,
        target: SessionKey,
    ) -> SchedulingResult<Mutation<RescheduleResult>> {
        self.bounded("reschedule", async {
            let today = self.today();
            let mut keys = date_keys(from_date).to_vec();
            keys.push(target);
            let _guards = self.locks.acquire(keys.iter().copied()).await;

            let mut catalog = self.load_sessions(&keys).await?;
            let mut store = self.load_bound_to(from_date).await?;
            let plan = plan_reschedule(&catalog, &store, from_date, target, today)?;
            let moved = apply_reschedule(&mut catalog, &mut store, &plan)?;
            let delta = self
                .commit("reschedule", self.changes(None, &catalog, &store))
                .await?;
            info!("Rescheduled {} registrations from {} to {}", moved, from_date, target);
            Ok(Mutation {
                result: RescheduleResult {
                    from_date,
                    target,
                    moved,
                },
                delta,
            })
        })
        .await
    }

    /// Close both sessions of `date`, optionally rescheduling its examinees
    /// first. Without a target the configured orphan policy applies.
    pub async fn force_close(
        &self,
        date: NaiveDate,
        reschedule_target: Option<SessionKey>,
    ) -> SchedulingResult<Mutation<ClosureReport>> {
        self.bounded("force_close", async {
            let today = self.today();
            let mut keys = date_keys(date).to_vec();
            keys.extend(reschedule_target);
            let _guards = self.locks.acquire(keys.iter().copied()).await;

            let mut catalog = self.load_sessions(&keys).await?;
            let mut store = self.load_bound_to(date).await?;
            let report = closure::force_close(
                &mut catalog,
                &mut store,
                date,
                reschedule_target,
                self.settings.orphan_policy,
                today,
            )?;
            let delta = self
                .commit("force_close", self.changes(None, &catalog, &store))
                .await?;
            if !report.orphaned.is_empty() {
                warn!(
                    "{} closed with {} orphaned registrations",
                    date,
                    report.orphaned.len()
                );
            }
            Ok(Mutation { result: report, delta })
        })
        .await
    }

    /// Archive completed and cancelled registrations.
    pub async fn archive_terminal(
        &self,
        selection: &ArchiveSelection,
    ) -> SchedulingResult<Mutation<ArchiveResult>> {
        self.bounded("archive_terminal", async {
            let registrations = match selection {
                ArchiveSelection::AllEligible => {
                    self.repository
                        .list_registrations(&RegistrationFilter::default())
                        .await?
                }
                ArchiveSelection::Ids(ids) => self.repository.get_registrations(ids).await?,
            };
            let mut store = RegistrationStore::from_registrations(registrations);
            let ids = closure::archive_terminal(&mut store, selection)?;
            let delta = self
                .commit("archive_terminal", self.changes(None, &ScheduleCatalog::new(), &store))
                .await?;
            Ok(Mutation {
                result: ArchiveResult {
                    archived: ids.len(),
                    ids,
                },
                delta,
            })
        })
        .await
    }

    // ==================== Sync ====================

    /// Full read of window, sessions and every registration (archived too).
    pub async fn snapshot(&self) -> SchedulingResult<SchedulingSnapshot> {
        let window = self.get_window().await?;
        let sessions = self.repository.list_sessions(None).await?;
        let registrations = self
            .repository
            .list_registrations(&RegistrationFilter {
                include_archived: true,
                ..Default::default()
            })
            .await?;
        Ok(SchedulingSnapshot {
            window,
            sessions,
            registrations,
        })
    }

    // ==================== Helpers ====================

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> SchedulingResult<T>
    where
        F: Future<Output = SchedulingResult<T>>,
    {
        let limit = self.settings.operation_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} exceeded its {:?} bound", operation, limit);
                Err(SchedulingError::Timeout(format!(
                    "{} did not finish within {} ms",
                    operation, self.settings.operation_timeout_ms
                )))
            }
        }
    }

    fn changes(
        &self,
        window: Option<RegistrationWindow>,
        catalog: &ScheduleCatalog,
        store: &RegistrationStore,
    ) -> ChangeSet {
        ChangeSet {
            window,
            sessions: catalog.touched_sessions(),
            registrations: store.touched_registrations(),
        }
    }

    async fn commit(&self, operation: &str, changes: ChangeSet) -> SchedulingResult<CanonicalDelta> {
        if changes.is_empty() {
            debug!("{} changed nothing", operation);
            return Ok(CanonicalDelta::default());
        }
        let rows = changes.len();
        match self.repository.commit(changes).await {
            Ok(delta) => {
                info!("{} committed {} rows", operation, rows);
                Ok(delta)
            }
            Err(e) => {
                warn!("{} rejected at commit: {}", operation, e);
                Err(e.with_operation(operation).into())
            }
        }
    }

    /// Load the given sessions; keys with no session are skipped.
    async fn load_sessions(&self, keys: &[SessionKey]) -> SchedulingResult<ScheduleCatalog> {
        let mut catalog = ScheduleCatalog::new();
        for key in keys {
            if catalog.contains(*key) {
                continue;
            }
            match self.repository.get_session(*key).await {
                Ok(session) => catalog.insert(session),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(catalog)
    }

    async fn load_bound_to(&self, date: NaiveDate) -> SchedulingResult<RegistrationStore> {
        let registrations = self
            .repository
            .list_registrations(&RegistrationFilter {
                assigned_date: Some(date),
                ..Default::default()
            })
            .await?;
        Ok(RegistrationStore::from_registrations(registrations))
    }

    async fn session_mutation(
        &self,
        operation: &str,
        catalog: &ScheduleCatalog,
        key: SessionKey,
    ) -> SchedulingResult<Mutation<Session>> {
        let delta = self
            .commit(operation, self.changes(None, catalog, &RegistrationStore::new()))
            .await?;
        Ok(Mutation {
            result: canonical_session(&delta, catalog, key)?,
            delta,
        })
    }

    async fn registration_mutation(
        &self,
        operation: &str,
        store: &RegistrationStore,
        id: RegistrationId,
    ) -> SchedulingResult<Mutation<Registration>> {
        let delta = self
            .commit(operation, self.changes(None, &ScheduleCatalog::new(), store))
            .await?;
        Ok(Mutation {
            result: canonical_registration(&delta, store, id)?,
            delta,
        })
    }

    async fn assignment_mutation(
        &self,
        operation: &str,
        catalog: &ScheduleCatalog,
        store: &RegistrationStore,
        id: RegistrationId,
        target: SessionKey,
    ) -> SchedulingResult<Mutation<Assignment>> {
        let delta = self.commit(operation, self.changes(None, catalog, store)).await?;
        let result = Assignment {
            registration: canonical_registration(&delta, store, id)?,
            session: canonical_session(&delta, catalog, target)?,
        };
        Ok(Mutation { result, delta })
    }
}

#[async_trait]
impl SnapshotSource for SchedulingService {
    async fn snapshot(&self) -> SchedulingResult<SchedulingSnapshot> {
        SchedulingService::snapshot(self).await
    }
}
