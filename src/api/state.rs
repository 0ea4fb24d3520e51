//! Application state for the API server

use crate::{Config, TaskService};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Facade over the task manager and key-value store
    pub service: TaskService,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: TaskService, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
