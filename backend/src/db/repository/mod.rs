//! Repository trait definitions for scheduling state.
//!
//! Persistence is split across focused traits so each backend can be
//! implemented and tested piecewise:
//!
//! - [`error`]: Error types for repository operations
//! - [`window`]: The registration window singleton
//! - [`session`]: Session rows keyed by `(date, period)`
//! - [`registration`]: Registration rows keyed by id
//! - [`commit`]: Versioned, all-or-nothing batch writes
//!
//! Reads are free to run concurrently. Every write goes through
//! [`CommitRepository::commit`], which is the only way capacity counts and
//! registration bindings change together.

pub mod commit;
pub mod error;
pub mod registration;
pub mod session;
pub mod window;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use commit::{ChangeSet, CommitRepository};
pub use registration::RegistrationRepository;
pub use session::SessionRepository;
pub use window::WindowRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four
/// repository traits.
pub trait FullRepository:
    WindowRepository + SessionRepository + RegistrationRepository + CommitRepository
{
}

impl<T> FullRepository for T where
    T: WindowRepository + SessionRepository + RegistrationRepository + CommitRepository
{
}
