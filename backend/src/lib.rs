//! # Exam Scheduler
//!
//! Scheduling core for enrolling examinees into dated, capacity-bounded exam
//! sessions inside a registration window.
//!
//! ## Features
//!
//! - **Assignment**: earliest valid session on or after the registration date
//! - **Rescheduling**: all-or-nothing moves of a date's examinees
//! - **Closure**: force-closing dates, archiving terminal registrations
//! - **Consistency**: per-session single-writer locks plus versioned commits
//! - **Sync**: canonical deltas and a periodic full refresh for caller copies
//! - **HTTP API**: optional JSON binding over axum
//!
//! ## Architecture
//!
//! - [`models`]: window, session and registration types
//! - [`scheduling`]: algorithms, locking and the [`scheduling::SchedulingService`]
//! - [`db`]: repository traits, the in-memory backend and configuration
//! - [`http`]: axum router and handlers (feature `http-server`)

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod scheduling;

#[cfg(feature = "http-server")]
pub mod http;
