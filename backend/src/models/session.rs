//! Exam sessions.
//!
//! A [`Session`] is identified by its [`SessionKey`] `(date, period)`. A date
//! conventionally carries one morning and one afternoon session, together
//! called a [`DateGroup`].

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Half-day slot of a session.
///
/// Ordering follows declaration order, so `Morning < Afternoon`. The assigner
/// relies on this for its tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPeriod {
    Morning,
    Afternoon,
}

impl SessionPeriod {
    /// Both periods in tie-break order.
    pub const ALL: [SessionPeriod; 2] = [SessionPeriod::Morning, SessionPeriod::Afternoon];

    /// Default `(start, end)` times used when a date group is created without
    /// explicit times.
    pub fn default_times(self) -> (NaiveTime, NaiveTime) {
        let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
        match self {
            SessionPeriod::Morning => (hm(8, 0), hm(12, 0)),
            SessionPeriod::Afternoon => (hm(13, 0), hm(17, 0)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPeriod::Morning => "morning",
            SessionPeriod::Afternoon => "afternoon",
        }
    }
}

impl fmt::Display for SessionPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morning" | "am" => Ok(Self::Morning),
            "afternoon" | "pm" => Ok(Self::Afternoon),
            _ => Err(format!("Unknown session period: {}", s)),
        }
    }
}

/// Identity of a session row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub date: NaiveDate,
    pub period: SessionPeriod,
}

impl SessionKey {
    pub fn new(date: NaiveDate, period: SessionPeriod) -> Self {
        Self { date, period }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.period)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Full,
    Closed,
}

/// A dated exam session with fixed capacity.
///
/// `booked` is historical occupancy: it is not decremented when an examinee
/// completes or cancels, and closing a session leaves it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub date: NaiveDate,
    pub period: SessionPeriod,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: u32,
    pub booked: u32,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_code: Option<String>,
    /// Optimistic concurrency version, bumped on every committed write.
    #[serde(default)]
    pub version: u64,
}

impl Session {
    /// Create an open, empty session with the period's default times.
    pub fn new(key: SessionKey, capacity: u32) -> Self {
        let (start_time, end_time) = key.period.default_times();
        let mut session = Self {
            date: key.date,
            period: key.period,
            start_time,
            end_time,
            capacity,
            booked: 0,
            status: SessionStatus::Open,
            exam_code: None,
            version: 0,
        };
        session.refresh_status();
        session
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.date, self.period)
    }

    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Closed
    }

    /// Free seats, or 0 when the session is closed.
    pub fn available_slots(&self) -> u32 {
        if self.is_closed() {
            0
        } else {
            self.capacity.saturating_sub(self.booked)
        }
    }

    /// Re-derive `Open`/`Full` from the counts. `Closed` is sticky.
    pub fn refresh_status(&mut self) {
        if self.is_closed() {
            return;
        }
        self.status = if self.booked >= self.capacity {
            SessionStatus::Full
        } else {
            SessionStatus::Open
        };
    }

    pub fn book(&mut self, seats: u32) {
        self.booked = self.booked.saturating_add(seats);
        self.refresh_status();
    }

    /// Release seats, flooring `booked` at zero.
    pub fn release(&mut self, seats: u32) {
        self.booked = self.booked.saturating_sub(seats);
        self.refresh_status();
    }
}

/// Inclusive date bounds for listings. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Start and end time of one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTimes {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Optional per-period times for a new date group; missing periods use
/// [`SessionPeriod::default_times`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateGroupTimes {
    #[serde(default)]
    pub morning: Option<PeriodTimes>,
    #[serde(default)]
    pub afternoon: Option<PeriodTimes>,
}

impl DateGroupTimes {
    pub fn for_period(&self, period: SessionPeriod) -> PeriodTimes {
        let explicit = match period {
            SessionPeriod::Morning => self.morning,
            SessionPeriod::Afternoon => self.afternoon,
        };
        explicit.unwrap_or_else(|| {
            let (start, end) = period.default_times();
            PeriodTimes { start, end }
        })
    }
}

/// The sessions sharing one date, in period order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub sessions: Vec<Session>,
}

impl DateGroup {
    pub fn session(&self, period: SessionPeriod) -> Option<&Session> {
        self.sessions.iter().find(|s| s.period == period)
    }

    pub fn total_booked(&self) -> u32 {
        self.sessions.iter().map(|s| s.booked).sum()
    }

    pub fn available_slots(&self) -> u32 {
        self.sessions.iter().map(Session::available_slots).sum()
    }

    /// True when every session of the date is closed.
    pub fn is_closed(&self) -> bool {
        !self.sessions.is_empty() && self.sessions.iter().all(Session::is_closed)
    }
}
