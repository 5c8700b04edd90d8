//! Application state for the HTTP server.

use std::sync::Arc;

use crate::scheduling::SchedulingService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SchedulingService>,
}

impl AppState {
    pub fn new(service: Arc<SchedulingService>) -> Self {
        Self { service }
    }
}
