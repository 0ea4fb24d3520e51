//! # taskfeed
//!
//! Pull-based work distribution over a paginated catalog.
//!
//! A [`TaskManager`] periodically scans the catalog in bounded batches into an
//! in-memory FIFO queue. Agents pull tasks through the [`TaskService`] facade
//! (or its REST API), which also reports live run statistics and keeps a
//! published client version in a key-value store.
//!
//! ## Design
//!
//! - **One run at a time** - a cron schedule (hourly by default) or a manual
//!   trigger starts a run only when the previous one has fully drained
//! - **Soft backpressure** - a fetch tick is skipped while the queue is near
//!   its cap, so consumers set the pace
//! - **Event-driven observation** - lifecycle events are broadcast to
//!   subscribers and streamed over SSE
//!
//! ## Quick Start
//!
//! ```no_run
//! use taskfeed::{Config, build_service};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.catalog.base_url = "http://catalog.internal:8080/scan".to_string();
//!
//!     let service = build_service(&config).await?;
//!
//!     // Subscribe to events
//!     let mut events = service.manager().subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let tasks = service.request_tasks("agent-1", 10).await?;
//!     println!("got {} tasks", tasks.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Scheduled fetch loop and FIFO work queue
pub mod manager;
/// Cron-driven recurring wakeups
pub mod scheduler;
/// Consumer-facing facade
pub mod service;
/// Catalog cursors and batch sources
pub mod source;
/// Key-value store abstraction
pub mod store;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

use std::sync::Arc;

// Re-export commonly used types
pub use config::{ApiConfig, CatalogConfig, Config, PersistenceConfig, TaskConfig};
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, ServerErrorKind, ToHttpStatus};
pub use manager::{SourceFactory, TaskManager};
pub use scheduler::{CronSchedule, RecurringJob};
pub use service::TaskService;
pub use source::{
    BatchSource, Catalog, CatalogSource, HttpCatalog, MemoryCatalog, MemorySource, ScanPage,
};
pub use store::{KeyValueStore, MemoryStore};
pub use types::{Event, Item, RunSnapshot, RunStatus, Stats, TaskView, Trigger};

/// Assemble and start a service from configuration
///
/// Validates `config`, opens the SQLite key-value store, wires a
/// [`TaskManager`] whose scheduled runs scan the HTTP catalog, and starts it.
pub async fn build_service(config: &Config) -> Result<TaskService> {
    config.validate()?;

    let catalog: Arc<dyn Catalog> = Arc::new(HttpCatalog::new(&config.catalog)?);
    let factory: SourceFactory = Arc::new(move || {
        Box::new(CatalogSource::new(catalog.clone())) as Box<dyn BatchSource>
    });

    let db = Database::new(&config.persistence.database_path).await?;

    let manager = TaskManager::new(config.tasks.clone(), factory);
    manager.start()?;

    tracing::info!(
        catalog = %config.catalog.base_url,
        database = %config.persistence.database_path.display(),
        "Task service ready"
    );

    Ok(TaskService::new(manager, Arc::new(db)))
}

/// Build the service, serve the REST API and shut down on a termination signal
///
/// # Example
///
/// ```no_run
/// use taskfeed::{Config, serve};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     serve(Config::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn serve(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let service = build_service(&config).await?;
    let manager = service.manager().clone();

    api::start_api_server(service, config, wait_for_signal()).await?;

    manager.shutdown();
    Ok(())
}

/// Wait for a termination signal, then shut the manager down.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use taskfeed::{Config, build_service, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = build_service(&Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(service.manager().clone()).await;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(manager: TaskManager) {
    wait_for_signal().await;
    manager.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
