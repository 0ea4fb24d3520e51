//! Timer-driven producer loop with soft backpressure

use super::TaskManager;
use crate::error::{Error, Result};
use crate::source::BatchSource;
use crate::types::Event;
use crate::utils::lock;
use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// What a single tick did
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    /// Queue above the threshold, nothing fetched
    Skipped,
    /// A batch was appended and the source has more
    Fetched,
    /// The source reported exhaustion; the loop is over
    Finished,
}

impl TaskManager {
    /// Pull batches from `source` every poll interval until it is exhausted,
    /// a batch fails, or `cancel` fires
    pub(crate) async fn fetch_loop(self, mut source: Box<dyn BatchSource>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.stop_fetching("fetch loop cancelled by shutdown".to_string());
                    return;
                }
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    self.stop_fetching("fetch loop cancelled by shutdown".to_string());
                    return;
                }
                outcome = self.fetch_tick(source.as_mut()) => outcome,
            };

            match outcome {
                Ok(TickOutcome::Finished) => return,
                Ok(TickOutcome::Skipped | TickOutcome::Fetched) => {}
                Err(e) => {
                    self.abort_run(&e);
                    return;
                }
            }
        }
    }

    /// One producer step: check backpressure, fetch outside the lock, append
    /// under it
    pub(crate) async fn fetch_tick(&self, source: &mut dyn BatchSource) -> Result<TickOutcome> {
        let threshold = self.config.backpressure_threshold();

        // Only this loop appends, so the length can only shrink between this
        // check and the append below.
        let queued = lock(&self.state).queue.len();
        if queued > threshold {
            tracing::debug!(queued, threshold, "Queue above threshold, skipping fetch");
            return Ok(TickOutcome::Skipped);
        }

        let batch = source.next_batch(self.config.scan_size).await?;
        let exhausted = source.is_exhausted();
        let count = batch.len();
        let now = Utc::now();

        let (fetched, available, drained) = {
            let mut inner = lock(&self.state);
            inner.queue.extend(batch);
            inner.run.fetched += count as u64;

            let drained = if exhausted {
                inner.run.fetching = false;
                inner.run.finished = Some(now);
                inner.note_drained()
            } else {
                false
            };

            (inner.run.fetched, inner.queue.len(), drained)
        };

        if count > 0 {
            tracing::debug!(count, fetched, available, "Batch appended to queue");
            self.emit(Event::BatchFetched {
                count,
                fetched,
                available,
            });
        }

        if !exhausted {
            return Ok(TickOutcome::Fetched);
        }

        tracing::info!(fetched, available, "Catalog exhausted, fetch loop finished");
        self.emit(Event::FetchFinished { fetched });

        if drained {
            self.announce_exhausted();
        }

        Ok(TickOutcome::Finished)
    }

    /// Stop the run's producer after a failed batch
    ///
    /// Items already queued stay available and drain normally.
    fn abort_run(&self, error: &Error) {
        tracing::error!(error = %error, "Fetch loop aborted");
        self.stop_fetching(error.to_string());
        self.emit(Event::FetchFailed {
            error: error.to_string(),
        });
    }

    fn stop_fetching(&self, reason: String) {
        let now = Utc::now();
        let drained = {
            let mut inner = lock(&self.state);
            inner.run.fetching = false;
            inner.run.finished = Some(now);
            inner.run.last_error = Some(reason);
            inner.note_drained()
        };

        if drained {
            self.announce_exhausted();
        }
    }

    pub(crate) fn announce_exhausted(&self) {
        let consumed = lock(&self.state).run.consumed;
        tracing::info!(consumed, "Queue exhausted");
        self.emit(Event::QueueExhausted { consumed });
    }
}
