//! Task manager: run lifecycle, bounded fetch loop and FIFO consume path.
//!
//! The `TaskManager` struct and its methods are organized by concern:
//! - this module - construction, scheduling, triggers and read accessors
//! - [`fetch`] - the timer-driven producer loop with soft backpressure
//! - [`consume`] - removing items from the queue head
//!
//! The queue and the run state share one mutex. Every mutation (append,
//! remove, exhaustion detection) happens inside a single critical section,
//! and the lock is never held across an `.await`.

mod consume;
mod fetch;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::TaskConfig;
use crate::error::{Error, Result, ServerErrorKind};
use crate::scheduler::{CronSchedule, RecurringJob};
use crate::source::BatchSource;
use crate::types::{Event, Item, RunSnapshot, Trigger};
use crate::utils::lock;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Creates a fresh [`BatchSource`] for each scheduled run
pub type SourceFactory = Arc<dyn Fn() -> Box<dyn BatchSource> + Send + Sync>;

/// Lifecycle record of the current run
#[derive(Clone, Debug, Default)]
pub(crate) struct RunState {
    pub(crate) started: Option<DateTime<Utc>>,
    pub(crate) finished: Option<DateTime<Utc>>,
    pub(crate) exhausted: Option<DateTime<Utc>>,
    pub(crate) scheduled: Option<DateTime<Utc>>,
    pub(crate) fetched: u64,
    pub(crate) consumed: u64,
    pub(crate) fetching: bool,
    pub(crate) last_error: Option<String>,
}

/// Everything guarded by the manager's lock
#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub(crate) queue: VecDeque<Item>,
    pub(crate) run: RunState,
}

impl Inner {
    pub(crate) fn is_busy(&self) -> bool {
        self.run.fetching || !self.queue.is_empty()
    }

    /// Record `exhausted` if the producer has stopped and the queue is empty.
    /// Returns true only on the call that sets it.
    ///
    /// The stamp is always strictly later than `finished`, even when both land
    /// on the same clock reading.
    pub(crate) fn note_drained(&mut self) -> bool {
        let Some(finished) = self.run.finished else {
            return false;
        };
        let drained =
            !self.run.fetching && self.run.exhausted.is_none() && self.queue.is_empty();
        if drained {
            let now = Utc::now();
            self.run.exhausted = Some(if now > finished {
                now
            } else {
                finished + TimeDelta::microseconds(1)
            });
        }
        drained
    }

    fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            started: self.run.started,
            finished: self.run.finished,
            exhausted: self.run.exhausted,
            scheduled: self.run.scheduled,
            fetched: self.run.fetched,
            consumed: self.run.consumed,
            available: self.queue.len(),
            fetching: self.run.fetching,
            last_error: self.run.last_error.clone(),
        }
    }
}

/// Scheduled catalog scanner and in-memory work queue
///
/// Cloning is cheap; all clones share the same queue and run state.
#[derive(Clone)]
pub struct TaskManager {
    /// Queue and run state
    pub(crate) state: Arc<Mutex<Inner>>,
    /// Batch size, queue cap, poll interval and cron rule
    pub(crate) config: Arc<TaskConfig>,
    /// Builds the source for scheduled runs
    pub(crate) source_factory: SourceFactory,
    /// Lifecycle event broadcast (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Registered recurring wakeup, present between start() and shutdown()
    pub(crate) schedule: Arc<Mutex<Option<RecurringJob>>>,
    /// Whether consumers may pop (set by start(), cleared by shutdown())
    pub(crate) accepting: Arc<AtomicBool>,
    /// Cancels running fetch loops on shutdown
    pub(crate) shutdown: CancellationToken,
}

impl TaskManager {
    /// Create a manager that builds one source per scheduled run via `source_factory`
    ///
    /// The manager is inert until [`start`](Self::start) is called: no wakeups
    /// are registered and [`pop_tasks`](Self::pop_tasks) fails.
    pub fn new(config: TaskConfig, source_factory: SourceFactory) -> Self {
        let (event_tx, _rx) = broadcast::channel(1000);

        Self {
            state: Arc::new(Mutex::new(Inner::default())),
            config: Arc::new(config),
            source_factory,
            event_tx,
            schedule: Arc::new(Mutex::new(None)),
            accepting: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Register the recurring wakeup and open the consume path
    ///
    /// Calling this on an already started manager is a no-op.
    ///
    /// # Errors
    ///
    /// Fails with a config error if the settings are unusable (zero scan size
    /// or poll interval, queue cap below the scan size) or the cron rule does
    /// not parse, or with a `TaskManagerError` if the manager was already shut
    /// down.
    pub fn start(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(Error::server(
                ServerErrorKind::TaskManagerError,
                "task manager has been shut down",
            ));
        }

        let mut schedule = lock(&self.schedule);
        if schedule.is_some() {
            return Ok(());
        }

        self.config.validate()?;
        let cron = CronSchedule::parse(&self.config.schedule)?;
        let manager = self.clone();
        let job = RecurringJob::register(cron, move || manager.on_scheduled_wakeup());
        let next = job.next_invocation();
        *schedule = Some(job);
        drop(schedule);

        {
            let mut inner = lock(&self.state);
            if inner.run.started.is_none() {
                inner.run.scheduled = next;
            }
        }
        self.accepting.store(true, Ordering::SeqCst);

        tracing::info!(
            schedule = %self.config.schedule,
            next = ?next,
            scan_size = self.config.scan_size,
            max_queue_size = self.config.max_queue_size,
            "Task manager started"
        );
        Ok(())
    }

    /// Whether [`start`](Self::start) has been called and shutdown has not
    pub fn is_started(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// True while the fetch loop runs or items are still queued
    pub fn is_busy(&self) -> bool {
        lock(&self.state).is_busy()
    }

    /// Start a run from `source` unless the manager is busy
    ///
    /// Returns whether a run was started. A trigger while busy is dropped
    /// silently; it is advisory, never preemptive.
    pub fn force_trigger(&self, source: Box<dyn BatchSource>) -> bool {
        self.begin_run(Trigger::Forced, source)
    }

    /// Start a run from a fresh factory source unless the manager is busy
    pub fn trigger_now(&self) -> bool {
        if self.is_busy() {
            self.ignore_trigger(Trigger::Forced);
            return false;
        }
        self.begin_run(Trigger::Forced, (self.source_factory)())
    }

    /// Consistent copy of the run state and queue length
    pub fn snapshot(&self) -> RunSnapshot {
        lock(&self.state).snapshot()
    }

    /// Items currently waiting in the queue
    pub fn available(&self) -> usize {
        lock(&self.state).queue.len()
    }

    /// Next scheduled wakeup, if the manager is started
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        lock(&self.schedule)
            .as_ref()
            .and_then(RecurringJob::next_invocation)
    }

    /// Engine settings
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Cancel the schedule and any running fetch loop, and close the consume path
    ///
    /// Items still queued are dropped with the manager; the queue is not
    /// persisted.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down task manager");

        self.accepting.store(false, Ordering::SeqCst);
        if let Some(job) = lock(&self.schedule).take() {
            job.cancel();
        }
        self.shutdown.cancel();
        self.emit(Event::Shutdown);
    }

    fn on_scheduled_wakeup(&self) {
        if !self.is_started() {
            return;
        }
        if self.is_busy() {
            self.ignore_trigger(Trigger::Scheduled);
            return;
        }
        self.begin_run(Trigger::Scheduled, (self.source_factory)());
    }

    fn ignore_trigger(&self, trigger: Trigger) {
        tracing::info!(?trigger, "Trigger ignored, previous run still active");
        self.emit(Event::TriggerIgnored { trigger });
    }

    /// Reset the run state and spawn the fetch loop, if not busy
    fn begin_run(&self, trigger: Trigger, source: Box<dyn BatchSource>) -> bool {
        if self.shutdown.is_cancelled() {
            tracing::warn!(?trigger, "Trigger after shutdown ignored");
            return false;
        }

        let scheduled = self.next_wakeup();
        let started = Utc::now();
        {
            let mut inner = lock(&self.state);
            if inner.is_busy() {
                drop(inner);
                self.ignore_trigger(trigger);
                return false;
            }
            inner.run = RunState {
                started: Some(started),
                scheduled,
                fetching: true,
                ..RunState::default()
            };
        }

        tracing::info!(?trigger, next = ?scheduled, "Run started");
        self.emit(Event::RunStarted { trigger, started });

        let manager = self.clone();
        let cancel = self.shutdown.child_token();
        tokio::spawn(async move {
            manager.fetch_loop(source, cancel).await;
        });

        true
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
