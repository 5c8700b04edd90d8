//! HTTP server module.
//!
//! Exposes the scheduling operations as a JSON REST API over axum. Handlers
//! only translate between wire types and [`SchedulingService`] calls; every
//! rule lives in the scheduling core.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP Layer (axum handlers)                               │
//! │  - Path/query/body parsing                                │
//! │  - JSON serialization/deserialization                     │
//! │  - CORS, compression, error mapping                       │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  SchedulingService (scheduling::service)                  │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! [`SchedulingService`]: crate::scheduling::SchedulingService

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
