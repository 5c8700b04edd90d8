#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use exam_scheduler::db::repo_config::SchedulingSettings;
use exam_scheduler::db::repositories::LocalRepository;
use exam_scheduler::models::{RegistrationWindow, Semester, SessionKey, SessionPeriod};
use exam_scheduler::scheduling::{FixedClock, SchedulingService};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to process-global
/// env vars so parallel tests do not observe each other's changes.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// =========================================================
// Scheduling fixtures
// =========================================================

/// A June 2025 date.
pub fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

pub fn morning(day: u32) -> SessionKey {
    SessionKey::new(june(day), SessionPeriod::Morning)
}

pub fn afternoon(day: u32) -> SessionKey {
    SessionKey::new(june(day), SessionPeriod::Afternoon)
}

/// Open summer window covering all of June 2025.
pub fn june_window() -> RegistrationWindow {
    RegistrationWindow {
        is_open: true,
        academic_year: "2024-2025".to_string(),
        semester: Semester::Summer,
        start_date: Some(june(1)),
        end_date: Some(june(30)),
        ..Default::default()
    }
}

pub struct Fixture {
    pub service: SchedulingService,
    pub repo: Arc<LocalRepository>,
    pub clock: Arc<FixedClock>,
}

/// Service over an empty in-memory repository with the June window and
/// "today" pinned to `today`.
pub fn fixture_at(today: NaiveDate, settings: SchedulingSettings) -> Fixture {
    let repo = Arc::new(LocalRepository::new());
    repo.set_window(june_window());
    let clock = Arc::new(FixedClock::new(today));
    let service = SchedulingService::new(repo.clone(), clock.clone(), settings);
    Fixture {
        service,
        repo,
        clock,
    }
}

pub fn fixture() -> Fixture {
    fixture_at(june(2), SchedulingSettings::default())
}
