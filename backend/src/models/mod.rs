//! Domain types for exam session scheduling.
//!
//! - [`window`]: the registration window for an academic term
//! - [`session`]: dated, capacity-bounded exam sessions and their keys
//! - [`registration`]: examinee registrations and their lifecycle

pub mod registration;
pub mod session;
pub mod window;

pub use registration::*;
pub use session::*;
pub use window::*;
