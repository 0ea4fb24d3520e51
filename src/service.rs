//! Consumer-facing facade over the task manager and the key-value store.

use crate::error::{Error, Result, ServerErrorKind};
use crate::manager::TaskManager;
use crate::store::KeyValueStore;
use crate::types::{RunSnapshot, RunStatus, Stats, TaskView};
use crate::utils::{elapsed_millis, format_elapsed, throughput};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Store key holding the published client version
pub const CLIENT_VERSION_KEY: &str = "client_version";

/// Client version reported when none has been published
pub const DEFAULT_CLIENT_VERSION: &str = "1";

/// Validates consumer requests, shapes results and derives statistics
#[derive(Clone)]
pub struct TaskService {
    manager: TaskManager,
    store: Arc<dyn KeyValueStore>,
}

impl TaskService {
    /// Facade over `manager`, keeping the client version in `store`
    pub fn new(manager: TaskManager, store: Arc<dyn KeyValueStore>) -> Self {
        Self { manager, store }
    }

    /// The underlying manager
    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }

    /// Hand up to `size` queued items to `agent`
    ///
    /// The agent identity is required but otherwise unused.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty agent; `TaskManagerError` if the manager
    /// is not started.
    pub async fn request_tasks(&self, agent: &str, size: usize) -> Result<Vec<TaskView>> {
        if agent.is_empty() {
            return Err(Error::invalid_argument("agent", "agent is required"));
        }

        let items = self.manager.pop_tasks(size).await?;
        tracing::debug!(agent, requested = size, handed_out = items.len(), "Tasks requested");

        Ok(items.iter().map(TaskView::from).collect())
    }

    /// Live statistics for the current run
    pub fn get_stats(&self) -> Stats {
        stats_at(&self.manager.snapshot(), Utc::now())
    }

    /// Published client version, [`DEFAULT_CLIENT_VERSION`] if none
    pub async fn get_client_version(&self) -> Result<String> {
        let stored = self
            .store
            .get(CLIENT_VERSION_KEY)
            .await
            .map_err(store_error)?;
        Ok(stored.unwrap_or_else(|| DEFAULT_CLIENT_VERSION.to_string()))
    }

    /// Publish a new client version (no expiry)
    pub async fn set_client_version(&self, version: &str) -> Result<()> {
        if version.is_empty() {
            return Err(Error::invalid_argument("version", "version must not be empty"));
        }

        self.store
            .set(CLIENT_VERSION_KEY, version, None)
            .await
            .map_err(store_error)?;

        tracing::info!(version, "Client version updated");
        Ok(())
    }
}

fn store_error(e: Error) -> Error {
    tracing::error!(error = %e, "Key-value store request failed");
    Error::server(ServerErrorKind::StoreError, e.to_string())
}

/// Derive [`Stats`] from a snapshot as of `now`
///
/// Fetch throughput runs from `started` to `finished`, consume throughput and
/// the elapsed string from `started` to `exhausted`; an open end uses `now`.
pub fn stats_at(snapshot: &RunSnapshot, now: DateTime<Utc>) -> Stats {
    let fetch_ms = elapsed_millis(snapshot.started, snapshot.finished, now);
    let consume_ms = elapsed_millis(snapshot.started, snapshot.exhausted, now);

    Stats {
        status: if snapshot.is_busy() {
            RunStatus::Running
        } else {
            RunStatus::Idle
        },
        started: snapshot.started,
        finished: snapshot.finished,
        exhausted: snapshot.exhausted,
        scheduled: snapshot.scheduled,
        elapsed: format_elapsed(consume_ms),
        fetched: snapshot.fetched,
        consumed: snapshot.consumed,
        available: snapshot.available,
        fetch_throughput: throughput(snapshot.fetched, fetch_ms),
        consume_throughput: throughput(snapshot.consumed, consume_ms),
        last_error: snapshot.last_error.clone(),
    }
}
