//! Closure workflow: force-closing a date and archiving terminal registrations.

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::catalog::ScheduleCatalog;
use super::error::{SchedulingError, SchedulingResult};
use super::reschedule::{apply_reschedule, plan_reschedule};
use super::store::RegistrationStore;
use crate::models::{RegistrationId, SessionKey, SessionPeriod};

/// What to do with active registrations when a date is closed without a
/// reschedule target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Close anyway and leave the assignments pointing at the closed sessions.
    #[default]
    Leave,
    /// Refuse to close while anyone is still bound to the date.
    Block,
    /// Cancel the bound registrations as part of the close.
    Cancel,
}

impl std::str::FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "leave" => Ok(Self::Leave),
            "block" => Ok(Self::Block),
            "cancel" => Ok(Self::Cancel),
            _ => Err(format!("Unknown orphan policy: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureState {
    Closed,
    /// Only some periods of the date exist, so the pair could not close together.
    PartiallyClosed,
}

/// Outcome of [`force_close`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureReport {
    pub date: NaiveDate,
    pub state: ClosureState,
    /// Periods closed by this call.
    pub closed: Vec<SessionPeriod>,
    /// Periods that were already closed.
    pub already_closed: Vec<SessionPeriod>,
    /// Periods with no session configured on the date.
    pub missing_periods: Vec<SessionPeriod>,
    pub rescheduled: usize,
    /// Registrations left bound to the closed sessions.
    pub orphaned: Vec<RegistrationId>,
    pub cancelled: Vec<RegistrationId>,
}

/// Close every session on `date`.
///
/// With a `reschedule_target`, active registrations on the date are first
/// moved there under the reschedule rules; a rejected move aborts the whole
/// close. Without one, `policy` decides what happens to them.
pub fn force_close(
    catalog: &mut ScheduleCatalog,
    store: &mut RegistrationStore,
    date: NaiveDate,
    reschedule_target: Option<SessionKey>,
    policy: OrphanPolicy,
    today: NaiveDate,
) -> SchedulingResult<ClosureReport> {
    let present: Vec<SessionPeriod> = catalog.sessions_for_date(date).iter().map(|s| s.period).collect();
    if present.is_empty() {
        return Err(SchedulingError::not_found(format!(
            "No sessions configured on {}",
            date
        )));
    }
    if let Some(target) = reschedule_target {
        if target.date == date {
            return Err(SchedulingError::validation(format!(
                "reschedule target {} is on the date being closed",
                target
            )));
        }
        // Checked even when nobody is bound, so a bad target never passes silently.
        catalog.session(target)?;
    }

    let mut report = ClosureReport {
        date,
        state: ClosureState::Closed,
        closed: Vec::new(),
        already_closed: Vec::new(),
        missing_periods: SessionPeriod::ALL
            .into_iter()
            .filter(|p| !present.contains(p))
            .collect(),
        rescheduled: 0,
        orphaned: Vec::new(),
        cancelled: Vec::new(),
    };

    let bound = store.active_bound_to(date);
    if !bound.is_empty() {
        match (reschedule_target, policy) {
            (Some(target), _) => {
                let plan = plan_reschedule(catalog, store, date, target, today)?;
                report.rescheduled = apply_reschedule(catalog, store, &plan)?;
            }
            (None, OrphanPolicy::Block) => {
                return Err(SchedulingError::validation(format!(
                    "{} has {} active registrations and no reschedule target",
                    date,
                    bound.len()
                )));
            }
            (None, OrphanPolicy::Cancel) => {
                for id in &bound {
                    store.cancel(*id)?;
                }
                report.cancelled = bound;
            }
            (None, OrphanPolicy::Leave) => {
                warn!(
                    "Closing {} leaves {} active registrations without a session",
                    date,
                    bound.len()
                );
                report.orphaned = bound;
            }
        }
    }

    for period in present {
        let key = SessionKey::new(date, period);
        if catalog.session(key)?.is_closed() {
            report.already_closed.push(period);
        } else {
            catalog.close(key)?;
            report.closed.push(period);
        }
    }
    if !report.missing_periods.is_empty() {
        report.state = ClosureState::PartiallyClosed;
    }
    Ok(report)
}

/// Which registrations [`archive_terminal`] should consider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveSelection {
    AllEligible,
    Ids(Vec<RegistrationId>),
}

/// Move completed and cancelled registrations to `archived`.
///
/// Non-terminal registrations in an explicit id list are skipped, never
/// archived. Unknown ids fail the whole call before anything changes.
/// Returns the ids that moved; repeating the call returns an empty list.
pub fn archive_terminal(
    store: &mut RegistrationStore,
    selection: &ArchiveSelection,
) -> SchedulingResult<Vec<RegistrationId>> {
    let candidates: Vec<RegistrationId> = match selection {
        ArchiveSelection::AllEligible => store
            .iter()
            .filter(|r| r.status.is_terminal())
            .map(|r| r.id)
            .collect(),
        ArchiveSelection::Ids(ids) => {
            for id in ids {
                store.get(*id)?;
            }
            ids.clone()
        }
    };

    let mut archived = Vec::new();
    for id in candidates {
        if store.archive(id)? {
            archived.push(id);
        }
    }
    if !archived.is_empty() {
        info!("Archived {} terminal registrations", archived.len());
    }
    Ok(archived)
}
