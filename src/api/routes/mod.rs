//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - `tasks` - Task hand-out, statistics and manual triggers
//! - `client` - Published client version
//! - `system` - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod client;
mod system;
mod tasks;

pub use client::*;
pub use system::*;
pub use tasks::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /tasks/request
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RequestTasksBody {
    /// Identity of the requesting agent (required, non-empty)
    #[serde(default)]
    pub agent: String,
    /// Maximum number of tasks to hand out
    pub size: usize,
}

/// Response for POST /tasks/trigger
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct TriggerResponse {
    /// Whether a new run was started (false if one was still active)
    pub started: bool,
}

/// Request and response body for /client-version
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ClientVersionBody {
    /// Published client version
    pub version: String,
}
