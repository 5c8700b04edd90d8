//! Repository implementations module.
//!
//! - `local`: In-memory implementation for unit testing, local development
//!   and single-process deployments
pub mod local;

pub use local::LocalRepository;
