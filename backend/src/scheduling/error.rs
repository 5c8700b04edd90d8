//! Error taxonomy for scheduling operations.
//!
//! Every rejected operation names the constraint it violated, with the
//! numbers involved, so a failure can be diagnosed from the message alone.
//! Nothing here is retried by the core; [`SchedulingError::is_retryable`]
//! tells the caller whether a single retry after re-reading is safe.

use chrono::NaiveDate;

use crate::db::repository::RepositoryError;
use crate::models::SessionKey;

pub type SchedulingResult<T> = Result<T, SchedulingError>;

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// Malformed or missing input, or an illegal lifecycle transition.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Date outside the registration window bounds.
    #[error("Out of window: {0}")]
    OutOfWindow(String),

    #[error("Past date: {date} is before today ({today})")]
    PastDate { date: NaiveDate, today: NaiveDate },

    /// A single session, or every candidate session, has no free seat.
    #[error("No capacity: {0}")]
    NoCapacity(String),

    /// Aggregate demand exceeds what the destination session can take.
    #[error("Insufficient capacity: target session {target} only has {available} slots, need {needed}")]
    InsufficientCapacity {
        target: SessionKey,
        available: u32,
        needed: u32,
    },

    #[error("Session closed: {0} is not accepting assignments")]
    SessionClosed(SessionKey),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Concurrent modification detected; safe to retry once after a re-read.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation did not finish within its time bound.
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl SchedulingError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict(_) | Self::Timeout(_) => true,
            Self::Repository(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Stable machine-readable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::OutOfWindow(_) => "OUT_OF_WINDOW",
            Self::PastDate { .. } => "PAST_DATE",
            Self::NoCapacity(_) => "NO_CAPACITY",
            Self::InsufficientCapacity { .. } => "INSUFFICIENT_CAPACITY",
            Self::SessionClosed(_) => "SESSION_CLOSED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Timeout(_) => "TIMEOUT",
            Self::Repository(_) => "REPOSITORY_ERROR",
        }
    }
}

impl From<RepositoryError> for SchedulingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, .. } => Self::NotFound(message),
            RepositoryError::ValidationError { message, .. } => Self::Validation(message),
            err @ RepositoryError::Conflict { .. } => Self::Conflict(err.to_string()),
            other => Self::Repository(other),
        }
    }
}
