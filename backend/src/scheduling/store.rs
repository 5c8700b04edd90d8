//! Registration store: the working set of registrations an operation touches.
//!
//! Owns the registration lifecycle. Capacity bookkeeping belongs to the
//! [`ScheduleCatalog`](super::catalog::ScheduleCatalog); the two only move
//! together inside the assigner, reschedule and closure operations.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::error::{SchedulingError, SchedulingResult};
use crate::models::{Registration, RegistrationId, RegistrationStatus};

#[derive(Debug, Clone, Default)]
pub struct RegistrationStore {
    registrations: BTreeMap<RegistrationId, Registration>,
    touched: BTreeSet<RegistrationId>,
}

impl RegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registrations(registrations: impl IntoIterator<Item = Registration>) -> Self {
        let mut store = Self::new();
        for registration in registrations {
            store.insert(registration);
        }
        store
    }

    /// Add a registration as loaded state. Does not mark it modified.
    pub fn insert(&mut self, registration: Registration) {
        self.registrations.insert(registration.id, registration);
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.values()
    }

    pub fn get(&self, id: RegistrationId) -> SchedulingResult<&Registration> {
        self.registrations
            .get(&id)
            .ok_or_else(|| SchedulingError::not_found(format!("Registration {} not found", id)))
    }

    pub(crate) fn get_mut(&mut self, id: RegistrationId) -> SchedulingResult<&mut Registration> {
        let registration = self
            .registrations
            .get_mut(&id)
            .ok_or_else(|| SchedulingError::not_found(format!("Registration {} not found", id)))?;
        self.touched.insert(id);
        Ok(registration)
    }

    /// Ids of active registrations bound to any session on `date`.
    pub fn active_bound_to(&self, date: NaiveDate) -> Vec<RegistrationId> {
        self.registrations
            .values()
            .filter(|r| r.is_active_on(date))
            .map(|r| r.id)
            .collect()
    }

    /// Mark an assigned registration as completed.
    ///
    /// No capacity interaction: the seat stays counted as historical
    /// occupancy.
    pub fn complete(&mut self, id: RegistrationId) -> SchedulingResult<&Registration> {
        let current = self.get(id)?.status;
        if current != RegistrationStatus::Assigned {
            return Err(SchedulingError::validation(format!(
                "registration {} is {}; only assigned registrations can be completed",
                id, current
            )));
        }
        let registration = self.get_mut(id)?;
        registration.status = RegistrationStatus::Completed;
        Ok(&*registration)
    }

    /// Mark an active registration as cancelled (withdrawal or no-show).
    pub fn cancel(&mut self, id: RegistrationId) -> SchedulingResult<&Registration> {
        let current = self.get(id)?.status;
        if !current.is_active() {
            return Err(SchedulingError::validation(format!(
                "registration {} is {}; only registered or assigned registrations can be cancelled",
                id, current
            )));
        }
        let registration = self.get_mut(id)?;
        registration.status = RegistrationStatus::Cancelled;
        Ok(&*registration)
    }

    /// Move a terminal registration to `archived`. Returns whether it moved.
    pub fn archive(&mut self, id: RegistrationId) -> SchedulingResult<bool> {
        if !self.get(id)?.status.is_terminal() {
            return Ok(false);
        }
        self.get_mut(id)?.status = RegistrationStatus::Archived;
        Ok(true)
    }

    /// Registrations modified since load, in id order.
    pub fn touched_registrations(&self) -> Vec<Registration> {
        self.touched
            .iter()
            .filter_map(|id| self.registrations.get(id).cloned())
            .collect()
    }
}
