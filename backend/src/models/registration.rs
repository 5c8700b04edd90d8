//! Examinee registrations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::session::SessionKey;

/// Sequential registration id. Serialized as the bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationId(pub i64);

impl RegistrationId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RegistrationId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<RegistrationId> for i64 {
    fn from(id: RegistrationId) -> Self {
        id.0
    }
}

/// Lifecycle of a registration.
///
/// `registered -> assigned -> completed | cancelled -> archived`.
/// `archived` is terminal and excluded from every active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Registered,
    Assigned,
    #[serde(alias = "finished")]
    Completed,
    Cancelled,
    Archived,
}

impl RegistrationStatus {
    /// Still waiting for, or holding, a seat.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Registered | Self::Assigned)
    }

    /// Eligible for archiving.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Assigned => "assigned",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "registered" => Ok(Self::Registered),
            "assigned" => Ok(Self::Assigned),
            "completed" | "finished" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Unknown registration status: {}", s)),
        }
    }
}

/// One examinee attempt.
///
/// The assigned date and period live in a single [`SessionKey`], so they are
/// always set or cleared together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub examinee_ref: String,
    pub registration_date: NaiveDate,
    #[serde(default)]
    pub assignment: Option<SessionKey>,
    pub status: RegistrationStatus,
    #[serde(default)]
    pub version: u64,
}

impl Registration {
    pub fn new(id: RegistrationId, examinee_ref: impl Into<String>, registration_date: NaiveDate) -> Self {
        Self {
            id,
            examinee_ref: examinee_ref.into(),
            registration_date,
            assignment: None,
            status: RegistrationStatus::Registered,
            version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Active and bound to a session on `date`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.is_active() && self.assignment.is_some_and(|key| key.date == date)
    }

    /// Bind to a session and mark as assigned.
    pub fn bind(&mut self, key: SessionKey) {
        self.assignment = Some(key);
        self.status = RegistrationStatus::Assigned;
    }
}

/// Input for creating a registration; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    pub examinee_ref: String,
    pub registration_date: NaiveDate,
}

/// Read filter for registration listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFilter {
    #[serde(default)]
    pub status: Option<RegistrationStatus>,
    #[serde(default)]
    pub assigned_date: Option<NaiveDate>,
    #[serde(default)]
    pub include_archived: bool,
}

impl RegistrationFilter {
    pub fn matches(&self, registration: &Registration) -> bool {
        if registration.status == RegistrationStatus::Archived
            && !self.include_archived
            && self.status != Some(RegistrationStatus::Archived)
        {
            return false;
        }
        if let Some(status) = self.status {
            if registration.status != status {
                return false;
            }
        }
        if let Some(date) = self.assigned_date {
            if registration.assignment.map(|k| k.date) != Some(date) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionPeriod;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_status_classification() {
        assert!(RegistrationStatus::Registered.is_active());
        assert!(RegistrationStatus::Assigned.is_active());
        assert!(!RegistrationStatus::Completed.is_active());
        assert!(RegistrationStatus::Cancelled.is_terminal());
        assert!(!RegistrationStatus::Archived.is_terminal());
        assert!(!RegistrationStatus::Assigned.is_terminal());
    }

    #[test]
    fn test_registration_id_is_a_bare_integer_on_the_wire() {
        let id = RegistrationId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn test_finished_is_an_alias_of_completed() {
        let status: RegistrationStatus = serde_json::from_str("\"finished\"").unwrap();
        assert_eq!(status, RegistrationStatus::Completed);
        assert_eq!("finished".parse::<RegistrationStatus>().unwrap(), RegistrationStatus::Completed);
    }

    #[test]
    fn test_bind_sets_assignment_and_status() {
        let mut reg = Registration::new(RegistrationId::new(1), "EX-1", date(9));
        reg.bind(SessionKey::new(date(12), SessionPeriod::Morning));
        assert_eq!(reg.status, RegistrationStatus::Assigned);
        assert!(reg.is_active_on(date(12)));
        assert!(!reg.is_active_on(date(13)));
    }

    #[test]
    fn test_filter_hides_archived_by_default() {
        let mut reg = Registration::new(RegistrationId::new(1), "EX-1", date(9));
        reg.status = RegistrationStatus::Archived;

        assert!(!RegistrationFilter::default().matches(&reg));
        let explicit = RegistrationFilter {
            status: Some(RegistrationStatus::Archived),
            ..Default::default()
        };
        assert!(explicit.matches(&reg));
    }
}
