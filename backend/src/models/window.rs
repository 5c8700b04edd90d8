//! The registration window of an academic term.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Semester {
    #[serde(rename = "1st")]
    First,
    #[serde(rename = "2nd")]
    Second,
    #[serde(rename = "Summer", alias = "summer")]
    Summer,
}

/// Open/closed flag plus date bounds for registration and assignment.
///
/// The stored `is_open` flag is only half the story: a window whose
/// `end_date` has passed is closed no matter what was stored. Callers must
/// read it through [`RegistrationWindow::effective`] every time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationWindow {
    pub is_open: bool,
    pub academic_year: String,
    pub semester: Semester,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub daily_capacity_hint: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub version: u64,
}

impl Default for RegistrationWindow {
    fn default() -> Self {
        Self {
            is_open: false,
            academic_year: String::new(),
            semester: Semester::First,
            start_date: None,
            end_date: None,
            daily_capacity_hint: 0,
            message: String::new(),
            version: 0,
        }
    }
}

impl RegistrationWindow {
    /// Check the structural invariants.
    ///
    /// An open window needs both bounds with `start_date <= end_date`.
    pub fn validate(&self) -> Result<(), String> {
        if self.academic_year.trim().is_empty() {
            return Err("academic_year is required".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(format!(
                    "start_date {} is after end_date {}",
                    start, end
                ));
            }
        }
        if self.is_open && (self.start_date.is_none() || self.end_date.is_none()) {
            return Err("an open window requires both start_date and end_date".to_string());
        }
        Ok(())
    }

    /// True when the stored flag says open but `today` is past `end_date`.
    pub fn should_auto_close(&self, today: NaiveDate) -> bool {
        self.is_open && self.end_date.is_some_and(|end| today > end)
    }

    /// The window as observed on `today`, with the auto-close rule applied.
    pub fn effective(&self, today: NaiveDate) -> Self {
        let mut window = self.clone();
        if window.should_auto_close(today) {
            window.is_open = false;
        }
        window
    }

    /// Whether `date` falls inside the bounds. A missing bound is unbounded.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}
