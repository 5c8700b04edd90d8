//! Assigner: picks the earliest valid session for a registration.
//!
//! The pick is a pure function of the catalog, the window and today's date.
//! Applying the result ([`assign_to`]) books the target seat, releases the
//! previous one on a re-assignment, and binds the registration, all on the
//! in-memory working set; the caller commits it as one batch.

use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

use super::catalog::ScheduleCatalog;
use super::error::{SchedulingError, SchedulingResult};
use super::store::RegistrationStore;
use crate::models::{Registration, RegistrationId, RegistrationWindow, SessionKey};

/// Pick the session a registration should be assigned to.
///
/// Candidate dates are those with at least one non-closed session with free
/// slots. The earliest candidate on or after
/// `max(registration_date, window.start_date, today)` and on or before
/// `window.end_date` wins; within that date the morning session comes first.
///
/// # Errors
/// * `NoCapacity` - no session anywhere has a free slot
/// * `PastDate` - every candidate lies before `today`
/// * `OutOfWindow` - candidates exist but none inside the bounds
pub fn pick_session(
    registration: &Registration,
    catalog: &ScheduleCatalog,
    window: &RegistrationWindow,
    today: NaiveDate,
) -> SchedulingResult<SessionKey> {
    let mut candidates: BTreeMap<NaiveDate, Vec<SessionKey>> = BTreeMap::new();
    for session in catalog.iter() {
        if session.available_slots() > 0 {
            candidates.entry(session.date).or_default().push(session.key());
        }
    }

    let Some((&latest, _)) = candidates.last_key_value() else {
        return Err(SchedulingError::NoCapacity(
            "no open session has a free slot".to_string(),
        ));
    };
    if latest < today {
        return Err(SchedulingError::PastDate {
            date: latest,
            today,
        });
    }

    let mut lower = registration.registration_date.max(today);
    if let Some(start) = window.start_date {
        lower = lower.max(start);
    }
    let upper = window.end_date;

    // Keys were pushed in catalog order, so each list is already morning-first.
    let chosen = candidates
        .range(lower..)
        .find(|(date, _)| upper.map_or(true, |end| **date <= end))
        .and_then(|(_, keys)| keys.first().copied());

    match chosen {
        Some(key) => {
            debug!(
                "Assigner picked {} for registration {} (lower bound {})",
                key, registration.id, lower
            );
            Ok(key)
        }
        None => {
            let earliest_future = candidates.range(today..).next().map(|(d, _)| *d);
            Err(SchedulingError::OutOfWindow(format!(
                "no session with free slots between {} and {}; earliest free date on or after today is {}",
                lower,
                upper.map_or_else(|| "open end".to_string(), |d| d.to_string()),
                earliest_future.map_or_else(|| "none".to_string(), |d| d.to_string()),
            )))
        }
    }
}

/// Check an explicit target for a manual assignment.
///
/// Checks run in a fixed order so the reported constraint is stable: the
/// session must exist, must not be in the past, must lie inside the window,
/// must not be closed, and must have a free slot.
pub fn check_manual_target(
    catalog: &ScheduleCatalog,
    window: &RegistrationWindow,
    today: NaiveDate,
    target: SessionKey,
) -> SchedulingResult<()> {
    let session = catalog.session(target)?;
    if target.date < today {
        return Err(SchedulingError::PastDate {
            date: target.date,
            today,
        });
    }
    if !window.contains(target.date) {
        return Err(SchedulingError::OutOfWindow(format!(
            "{} is outside the registration window {} to {}",
            target.date,
            window.start_date.map_or_else(|| "open start".to_string(), |d| d.to_string()),
            window.end_date.map_or_else(|| "open end".to_string(), |d| d.to_string()),
        )));
    }
    if session.is_closed() {
        return Err(SchedulingError::SessionClosed(target));
    }
    if session.available_slots() == 0 {
        return Err(SchedulingError::NoCapacity(format!(
            "session {} is full: capacity {}, booked {}",
            target, session.capacity, session.booked
        )));
    }
    Ok(())
}

/// Bind a registration to `target` on the working set.
///
/// Books one seat on the target and, when the registration was already bound
/// elsewhere, releases one seat on the previous session (floored at zero).
///
/// # Returns
/// * `Ok(true)` - the binding changed
/// * `Ok(false)` - the registration already held `target`; nothing changed
pub fn assign_to(
    store: &mut RegistrationStore,
    catalog: &mut ScheduleCatalog,
    id: RegistrationId,
    target: SessionKey,
) -> SchedulingResult<bool> {
    let registration = store.get(id)?;
    if !registration.is_active() {
        return Err(SchedulingError::validation(format!(
            "registration {} is {} and cannot be assigned",
            id, registration.status
        )));
    }
    if registration.assignment == Some(target) {
        return Ok(false);
    }
    let previous = registration.assignment;

    let session = catalog.session(target)?;
    if session.is_closed() {
        return Err(SchedulingError::SessionClosed(target));
    }
    if session.available_slots() == 0 {
        return Err(SchedulingError::NoCapacity(format!(
            "session {} is full: capacity {}, booked {}",
            target, session.capacity, session.booked
        )));
    }

    catalog.book(target, 1)?;
    if let Some(previous) = previous {
        catalog.release(previous, 1);
    }
    store.get_mut(id)?.bind(target);
    Ok(true)
}
