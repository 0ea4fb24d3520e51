//! Shared test helpers for creating TaskManager instances in tests.

use super::{SourceFactory, TaskManager};
use crate::config::TaskConfig;
use crate::error::{Error, Result, ServerErrorKind};
use crate::source::{BatchSource, CatalogSource, MemoryCatalog, MemorySource};
use crate::types::{Event, Item};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Engine settings with a short poll interval and a yearly schedule that
/// never fires during a test
pub(crate) fn test_config() -> TaskConfig {
    TaskConfig {
        scan_size: 200,
        max_queue_size: 1000,
        poll_interval: Duration::from_millis(10),
        schedule: "0 0 1 1 *".to_string(),
    }
}

/// Factory whose scheduled runs find an empty catalog
pub(crate) fn empty_factory() -> SourceFactory {
    Arc::new(|| Box::new(MemorySource::default()) as Box<dyn BatchSource>)
}

/// Factory whose scheduled runs scan `catalog`
pub(crate) fn catalog_factory(catalog: Arc<MemoryCatalog>) -> SourceFactory {
    Arc::new(move || Box::new(CatalogSource::new(catalog.clone())) as Box<dyn BatchSource>)
}

/// A manager built from [`test_config`] and already started
pub(crate) fn create_test_manager() -> TaskManager {
    create_manager_with(test_config(), empty_factory())
}

/// A started manager with custom settings
pub(crate) fn create_manager_with(config: TaskConfig, factory: SourceFactory) -> TaskManager {
    let manager = TaskManager::new(config, factory);
    manager.start().unwrap();
    manager
}

/// Block until an event matching `predicate` arrives (120s timeout, virtual
/// under paused time)
pub(crate) async fn wait_for_event<F>(rx: &mut broadcast::Receiver<Event>, mut predicate: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Force a run from `source` and wait until its fetch loop stops
pub(crate) async fn run_to_fetch_end(manager: &TaskManager, source: Box<dyn BatchSource>) {
    let mut rx = manager.subscribe();
    assert!(manager.force_trigger(source), "manager should accept the trigger");
    wait_for_event(&mut rx, |e| {
        matches!(e, Event::FetchFinished { .. } | Event::FetchFailed { .. })
    })
    .await;
}

/// Source that never runs dry: `prefix_1`, `prefix_2`, ... forever
pub(crate) struct EndlessSource {
    prefix: String,
    produced: usize,
}

impl EndlessSource {
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            produced: 0,
        }
    }
}

#[async_trait]
impl BatchSource for EndlessSource {
    fn is_exhausted(&self) -> bool {
        false
    }

    async fn next_batch(&mut self, max_size: usize) -> Result<Vec<Item>> {
        let batch = (self.produced + 1..=self.produced + max_size)
            .map(|n| Item::new(format!("{}_{}", self.prefix, n)))
            .collect();
        self.produced += max_size;
        Ok(batch)
    }
}

/// Source that serves the given batches and then fails like a broken catalog
pub(crate) struct FailingSource {
    batches: VecDeque<Vec<Item>>,
}

impl FailingSource {
    pub(crate) fn after(batches: Vec<Vec<Item>>) -> Self {
        Self {
            batches: batches.into(),
        }
    }
}

#[async_trait]
impl BatchSource for FailingSource {
    fn is_exhausted(&self) -> bool {
        false
    }

    async fn next_batch(&mut self, _max_size: usize) -> Result<Vec<Item>> {
        self.batches.pop_front().ok_or_else(|| {
            Error::server(
                ServerErrorKind::DataSourceError,
                "catalog reported 5 items but returned 3",
            )
        })
    }
}

/// `count` synthetic items named `<prefix>_<n>`
pub(crate) fn items(prefix: &str, count: usize) -> Vec<Item> {
    (1..=count)
        .map(|n| Item::new(format!("{}_{}", prefix, n)))
        .collect()
}
