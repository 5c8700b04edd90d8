//! Schedule catalog: the working set of sessions an operation reads and mutates.
//!
//! A catalog is loaded from the repository, mutated in memory by the
//! scheduling algorithms, and then written back as one batch. It records
//! which sessions were modified so only those rows go into the commit.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::error::{SchedulingError, SchedulingResult};
use crate::models::{DateGroup, DateRange, Session, SessionKey, SessionPeriod, SessionStatus};

#[derive(Debug, Clone, Default)]
pub struct ScheduleCatalog {
    sessions: BTreeMap<SessionKey, Session>,
    touched: BTreeSet<SessionKey>,
}

impl ScheduleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sessions(sessions: impl IntoIterator<Item = Session>) -> Self {
        let mut catalog = Self::new();
        for session in sessions {
            catalog.insert(session);
        }
        catalog
    }

    /// Add a session as loaded state. Does not mark it modified.
    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.key(), session);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn contains(&self, key: SessionKey) -> bool {
        self.sessions.contains_key(&key)
    }

    /// All sessions on `date`, morning first. Empty if none are configured.
    pub fn sessions_for_date(&self, date: NaiveDate) -> Vec<&Session> {
        let lo = SessionKey::new(date, SessionPeriod::Morning);
        let hi = SessionKey::new(date, SessionPeriod::Afternoon);
        self.sessions.range(lo..=hi).map(|(_, s)| s).collect()
    }

    pub fn session(&self, key: SessionKey) -> SchedulingResult<&Session> {
        self.sessions
            .get(&key)
            .ok_or_else(|| SchedulingError::not_found(format!("Session {} not found", key)))
    }

    /// `capacity - booked`, or 0 for a closed session.
    pub fn available_slots(&self, key: SessionKey) -> SchedulingResult<u32> {
        self.session(key).map(Session::available_slots)
    }

    /// Change a session's capacity.
    ///
    /// When `reopen_on_capacity_increase` is set and the session is closed, a
    /// capacity above zero reopens it; the status is then re-derived from the
    /// counts, so it comes back `full` if `booked` already meets the new
    /// capacity. A capacity below `booked` is accepted and leaves the session
    /// full; existing bookings are never undone.
    pub fn set_capacity(
        &mut self,
        key: SessionKey,
        capacity: u32,
        reopen_on_capacity_increase: bool,
    ) -> SchedulingResult<&Session> {
        let session = self.session_mut(key)?;
        session.capacity = capacity;
        if capacity > 0 && session.is_closed() && reopen_on_capacity_increase {
            session.status = SessionStatus::Open;
        }
        session.refresh_status();
        Ok(&*session)
    }

    /// Close a session. Idempotent; `booked` is preserved.
    pub fn close(&mut self, key: SessionKey) -> SchedulingResult<&Session> {
        if self.session(key)?.is_closed() {
            return self.session(key);
        }
        let session = self.session_mut(key)?;
        session.status = SessionStatus::Closed;
        Ok(&*session)
    }

    /// Explicitly reopen a closed session. Idempotent for open sessions.
    pub fn reopen(&mut self, key: SessionKey) -> SchedulingResult<&Session> {
        if !self.session(key)?.is_closed() {
            return self.session(key);
        }
        let session = self.session_mut(key)?;
        session.status = SessionStatus::Open;
        session.refresh_status();
        Ok(&*session)
    }

    pub fn book(&mut self, key: SessionKey, seats: u32) -> SchedulingResult<()> {
        self.session_mut(key)?.book(seats);
        Ok(())
    }

    /// Release seats, flooring at zero. Unknown sessions are ignored since a
    /// released seat on a session that no longer exists has nothing to undo.
    pub fn release(&mut self, key: SessionKey, seats: u32) {
        if let Ok(session) = self.session_mut(key) {
            session.release(seats);
        }
    }

    /// Attach an exam code to every session on `date`.
    pub fn set_exam_code(&mut self, date: NaiveDate, code: &str) -> SchedulingResult<usize> {
        let keys: Vec<SessionKey> = self.sessions_for_date(date).iter().map(|s| s.key()).collect();
        if keys.is_empty() {
            return Err(SchedulingError::not_found(format!(
                "No sessions configured on {}",
                date
            )));
        }
        for key in &keys {
            self.session_mut(*key)?.exam_code = Some(code.to_string());
        }
        Ok(keys.len())
    }

    /// Group sessions by date, optionally bounded.
    pub fn date_groups(&self, range: Option<DateRange>) -> Vec<DateGroup> {
        let mut groups: Vec<DateGroup> = Vec::new();
        for session in self.sessions.values() {
            if range.is_some_and(|r| !r.contains(session.date)) {
                continue;
            }
            match groups.last_mut() {
                Some(group) if group.date == session.date => group.sessions.push(session.clone()),
                _ => groups.push(DateGroup {
                    date: session.date,
                    sessions: vec![session.clone()],
                }),
            }
        }
        groups
    }

    /// Sessions modified since load, in key order.
    pub fn touched_sessions(&self) -> Vec<Session> {
        self.touched
            .iter()
            .filter_map(|key| self.sessions.get(key).cloned())
            .collect()
    }

    fn session_mut(&mut self, key: SessionKey) -> SchedulingResult<&mut Session> {
        let session = self
            .sessions
            .get_mut(&key)
            .ok_or_else(|| SchedulingError::not_found(format!("Session {} not found", key)))?;
        self.touched.insert(key);
        Ok(session)
    }
}
