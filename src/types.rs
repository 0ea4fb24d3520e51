//! Core types: catalog items, run snapshots, statistics and lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single record produced by a catalog scan
///
/// Only `id` is interpreted; every other field of the catalog record is kept
/// verbatim in `attributes`. Items are never mutated after they are produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Catalog identifier (e.g. `"cat_42"`)
    pub id: String,

    /// Remaining catalog fields, passed through untouched
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    /// Create an item carrying only an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: serde_json::Map::new(),
        }
    }
}

/// Consumer-facing view of an [`Item`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskView {
    /// Catalog identifier
    pub id: String,
    /// Second `_`-separated segment of `id`, or empty
    pub secondary_id: String,
}

impl From<&Item> for TaskView {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            secondary_id: crate::utils::secondary_id(&item.id).to_string(),
        }
    }
}

/// Point-in-time copy of the current run's state
///
/// Taken under the manager's lock, so every field is mutually consistent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RunSnapshot {
    /// When the current run began
    pub started: Option<DateTime<Utc>>,
    /// When the producer loop stopped
    pub finished: Option<DateTime<Utc>>,
    /// When the queue was first observed empty after `finished`
    pub exhausted: Option<DateTime<Utc>>,
    /// Next scheduled wakeup
    pub scheduled: Option<DateTime<Utc>>,
    /// Items appended to the queue during this run
    pub fetched: u64,
    /// Items handed out to consumers during this run
    pub consumed: u64,
    /// Items currently waiting in the queue
    pub available: usize,
    /// Whether the fetch loop is active
    pub fetching: bool,
    /// Error that aborted the fetch loop of this run, if any
    pub last_error: Option<String>,
}

impl RunSnapshot {
    /// Fetch loop active or items still queued
    pub fn is_busy(&self) -> bool {
        self.fetching || self.available > 0
    }
}

/// Coarse manager status reported in [`Stats`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// A run is fetching or draining
    Running,
    /// Waiting for the next wakeup
    Idle,
}

/// Statistics snapshot returned by `GET /tasks/stats`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Stats {
    /// `running` while busy, otherwise `idle`
    pub status: RunStatus,
    /// When the current run began
    pub started: Option<DateTime<Utc>>,
    /// When the producer loop stopped
    pub finished: Option<DateTime<Utc>>,
    /// When the queue drained after the producer stopped
    pub exhausted: Option<DateTime<Utc>>,
    /// Next scheduled wakeup
    pub scheduled: Option<DateTime<Utc>>,
    /// Total run duration formatted as `HH:MM:SS.mmm`
    pub elapsed: String,
    /// Items fetched this run
    pub fetched: u64,
    /// Items consumed this run
    pub consumed: u64,
    /// Items currently queued
    pub available: usize,
    /// Fetch throughput in items per second
    pub fetch_throughput: f64,
    /// Consume throughput in items per second
    pub consume_throughput: f64,
    /// Error that aborted the current run's fetch loop, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Why a run was started
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Recurring schedule fired
    Scheduled,
    /// Manual trigger
    Forced,
}

/// Event emitted during the run lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new run began
    RunStarted {
        /// What started the run
        trigger: Trigger,
        /// Run start time
        started: DateTime<Utc>,
    },

    /// A trigger arrived while the manager was busy and was dropped
    TriggerIgnored {
        /// What fired
        trigger: Trigger,
    },

    /// A batch was appended to the queue
    BatchFetched {
        /// Items in this batch
        count: usize,
        /// Items fetched so far in this run
        fetched: u64,
        /// Queue length after the append
        available: usize,
    },

    /// The catalog was exhausted and the fetch loop stopped
    FetchFinished {
        /// Total items fetched in this run
        fetched: u64,
    },

    /// The fetch loop was aborted by an error
    FetchFailed {
        /// Error message
        error: String,
    },

    /// The queue drained after the fetch loop stopped
    QueueExhausted {
        /// Total items consumed in this run
        consumed: u64,
    },

    /// The manager is shutting down
    Shutdown,
}
