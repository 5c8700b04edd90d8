//! Reschedule coordinator: moves every active registration of a date to one
//! destination session, all or nothing.

use chrono::NaiveDate;
use log::debug;

use super::catalog::ScheduleCatalog;
use super::error::{SchedulingError, SchedulingResult};
use super::store::RegistrationStore;
use crate::models::{RegistrationId, SessionKey};

/// A validated move, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReschedulePlan {
    pub from_date: NaiveDate,
    pub target: SessionKey,
    pub movers: Vec<RegistrationId>,
}

impl ReschedulePlan {
    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
    }
}

/// Validate a reschedule without mutating anything.
///
/// Movers are the active registrations bound to any session on `from_date`,
/// minus those already sitting in `target`. The destination must exist, must
/// not be in the past and, when there is anyone to move, must be open with
/// `available_slots >= movers`.
pub fn plan_reschedule(
    catalog: &ScheduleCatalog,
    store: &RegistrationStore,
    from_date: NaiveDate,
    target: SessionKey,
    today: NaiveDate,
) -> SchedulingResult<ReschedulePlan> {
    let destination = catalog.session(target)?;
    if target.date < today {
        return Err(SchedulingError::PastDate {
            date: target.date,
            today,
        });
    }

    let movers: Vec<RegistrationId> = store
        .active_bound_to(from_date)
        .into_iter()
        .filter(|id| {
            store
                .get(*id)
                .map(|r| r.assignment != Some(target))
                .unwrap_or(false)
        })
        .collect();

    if !movers.is_empty() {
        if destination.is_closed() {
            return Err(SchedulingError::SessionClosed(target));
        }
        let available = destination.available_slots();
        let needed = movers.len() as u32;
        if available < needed {
            return Err(SchedulingError::InsufficientCapacity {
                target,
                available,
                needed,
            });
        }
    }

    Ok(ReschedulePlan {
        from_date,
        target,
        movers,
    })
}

/// Apply a plan produced by [`plan_reschedule`] against the same working set.
///
/// Source sessions keep their `booked` counts as history; only the
/// destination grows. Returns the moved count.
pub fn apply_reschedule(
    catalog: &mut ScheduleCatalog,
    store: &mut RegistrationStore,
    plan: &ReschedulePlan,
) -> SchedulingResult<usize> {
    if plan.is_empty() {
        return Ok(0);
    }
    for id in &plan.movers {
        store.get_mut(*id)?.bind(plan.target);
    }
    catalog.book(plan.target, plan.movers.len() as u32)?;
    debug!(
        "Rescheduled {} registrations from {} to {}",
        plan.movers.len(),
        plan.from_date,
        plan.target
    );
    Ok(plan.movers.len())
}

/// Plan and apply in one step.
pub fn reschedule(
    catalog: &mut ScheduleCatalog,
    store: &mut RegistrationStore,
    from_date: NaiveDate,
    target: SessionKey,
    today: NaiveDate,
) -> SchedulingResult<usize> {
    let plan = plan_reschedule(catalog, store, from_date, target, today)?;
    apply_reschedule(catalog, store, &plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Registration, RegistrationStatus, Session, SessionPeriod};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn key(d: u32, period: SessionPeriod) -> SessionKey {
        SessionKey::new(date(d), period)
    }

    fn bound(id: i64, k: SessionKey, status: RegistrationStatus) -> Registration {
        let mut r = Registration::new(RegistrationId::new(id), format!("EX-{}", id), date(1));
        r.bind(k);
        r.status = status;
        r
    }

    fn fixture(dest_capacity: u32) -> (ScheduleCatalog, RegistrationStore) {
        let mut source = Session::new(key(10, SessionPeriod::Morning), 10);
        source.book(5);
        let catalog = ScheduleCatalog::from_sessions([
            source,
            Session::new(key(10, SessionPeriod::Afternoon), 10),
            Session::new(key(14, SessionPeriod::Morning), dest_capacity),
        ]);
        let mut regs: Vec<Registration> = (1..=4)
            .map(|i| bound(i, key(10, SessionPeriod::Morning), RegistrationStatus::Assigned))
            .collect();
        regs.push(bound(5, key(10, SessionPeriod::Afternoon), RegistrationStatus::Assigned));
        regs.push(bound(6, key(10, SessionPeriod::Morning), RegistrationStatus::Completed));
        (catalog, RegistrationStore::from_registrations(regs))
    }

    #[test]
    fn test_insufficient_capacity_moves_nobody() {
        let (mut catalog, mut store) = fixture(3);
        let err = reschedule(&mut catalog, &mut store, date(10), key(14, SessionPeriod::Morning), date(1))
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::InsufficientCapacity {
                available: 3,
                needed: 5,
                ..
            }
        ));
        assert!(store.touched_registrations().is_empty());
        assert!(catalog.touched_sessions().is_empty());
    }

    #[test]
    fn test_moves_active_registrations_from_both_periods() {
        let (mut catalog, mut store) = fixture(5);
        let target = key(14, SessionPeriod::Morning);
        let moved = reschedule(&mut catalog, &mut store, date(10), target, date(1)).unwrap();
        assert_eq!(moved, 5);
        assert_eq!(catalog.session(target).unwrap().booked, 5);
        // history preserved on the source
        assert_eq!(catalog.session(key(10, SessionPeriod::Morning)).unwrap().booked, 5);
        // the completed registration stays where it was
        assert_eq!(
            store.get(RegistrationId::new(6)).unwrap().assignment,
            Some(key(10, SessionPeriod::Morning))
        );
    }

    #[test]
    fn test_zero_movers_is_a_no_op() {
        let (mut catalog, mut store) = fixture(5);
        let moved = reschedule(&mut catalog, &mut store, date(11), key(14, SessionPeriod::Morning), date(1))
            .unwrap();
        assert_eq!(moved, 0);
        assert!(catalog.touched_sessions().is_empty());
    }

    #[test]
    fn test_registrations_already_at_destination_are_not_counted() {
        let (mut catalog, mut store) = fixture(10);
        let target = key(10, SessionPeriod::Afternoon);
        let plan = plan_reschedule(&catalog, &store, date(10), target, date(1)).unwrap();
        assert_eq!(plan.movers.len(), 4);
        assert_eq!(apply_reschedule(&mut catalog, &mut store, &plan).unwrap(), 4);
    }

    #[test]
    fn test_closed_destination_is_rejected() {
        let (mut catalog, store) = fixture(10);
        let target = key(14, SessionPeriod::Morning);
        catalog.close(target).unwrap();
        let err = plan_reschedule(&catalog, &store, date(10), target, date(1)).unwrap_err();
        assert_eq!(err.code(), "SESSION_CLOSED");
    }

    #[test]
    fn test_past_destination_is_rejected() {
        let (catalog, store) = fixture(10);
        let err = plan_reschedule(&catalog, &store, date(10), key(14, SessionPeriod::Morning), date(15))
            .unwrap_err();
        assert_eq!(err.code(), "PAST_DATE");
    }
}
