//! The scheduling core.
//!
//! Pure algorithms work on in-memory working sets:
//!
//! - [`catalog`]: sessions and capacity bookkeeping
//! - [`store`]: registrations and their lifecycle
//! - [`assigner`]: earliest-valid-session pick and manual target checks
//! - [`reschedule`]: all-or-nothing moves of a date's examinees
//! - [`closure`]: force-closing dates and archiving terminal registrations
//! - [`codes`]: exam codes for a date's sessions
//!
//! [`service::SchedulingService`] wraps them with locking ([`locks`]),
//! persistence and time bounds, and [`sync`] carries the canonical results
//! back to callers.

pub mod assigner;
pub mod catalog;
pub mod clock;
pub mod closure;
pub mod codes;
pub mod error;
pub mod locks;
pub mod reschedule;
pub mod service;
pub mod store;
pub mod sync;

pub use catalog::ScheduleCatalog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use closure::{ArchiveSelection, ClosureReport, ClosureState, OrphanPolicy};
pub use error::{SchedulingError, SchedulingResult};
pub use locks::SessionLocks;
pub use service::{
    ArchiveResult, Assignment, BulkAssignItem, BulkAssignOutcome, Mutation, RescheduleResult,
    SchedulingService,
};
pub use store::RegistrationStore;
pub use sync::{
    CanonicalDelta, LocalProjection, SchedulingSnapshot, SnapshotSource, SyncHandle, SyncPoller,
    SyncStats,
};
