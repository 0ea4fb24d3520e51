//! Recurring wakeups driven by cron expressions.
//!
//! A [`CronSchedule`] computes fire times; a [`RecurringJob`] owns a background
//! task that sleeps until each fire time and invokes a callback. The task
//! manager registers exactly one job for its scan schedule.
//!
//! # Example
//!
//! ```no_run
//! use taskfeed::scheduler::{CronSchedule, RecurringJob};
//!
//! # async fn example() -> taskfeed::Result<()> {
//! // Top of every hour
//! let schedule = CronSchedule::parse("0 * * * *")?;
//! let job = RecurringJob::register(schedule, || println!("wakeup"));
//!
//! println!("next wakeup at {:?}", job.next_invocation());
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::utils::lock;
use chrono::{DateTime, Utc};
use croner::Cron;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Parsed cron expression (5 fields: minute hour day month weekday)
#[derive(Clone)]
pub struct CronSchedule {
    expr: String,
    cron: Cron,
}

impl CronSchedule {
    /// Parse a cron expression
    pub fn parse(expr: &str) -> Result<Self> {
        let cron = Cron::from_str(expr).map_err(|e| Error::Config {
            message: format!("invalid cron expression '{}': {}", expr, e),
            key: Some("schedule".to_string()),
        })?;
        Ok(Self {
            expr: expr.to_string(),
            cron,
        })
    }

    /// First fire time strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.cron.find_next_occurrence(&after, false).map_err(|e| {
            error!(schedule = %self.expr, error = %e, "Failed to find next cron occurrence");
            Error::Config {
                message: format!("no next occurrence for '{}': {}", self.expr, e),
                key: Some("schedule".to_string()),
            }
        })
    }

    /// The original expression
    pub fn expression(&self) -> &str {
        &self.expr
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.expr).finish()
    }
}

impl PartialEq for CronSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

/// Handle to a registered recurring wakeup
///
/// The background task stops when [`RecurringJob::cancel`] is called or the
/// handle is dropped.
pub struct RecurringJob {
    schedule: CronSchedule,
    next: Arc<Mutex<Option<DateTime<Utc>>>>,
    cancel: CancellationToken,
}

impl RecurringJob {
    /// Register `callback` to run at every fire time of `schedule`
    ///
    /// Must be called from within a tokio runtime. The next fire time is
    /// computed before the callback runs, so a callback reading
    /// [`next_invocation`](Self::next_invocation) sees the following wakeup,
    /// not the one being delivered.
    pub fn register<F>(schedule: CronSchedule, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let now = Utc::now();
        let first = schedule.next_after(now).ok();
        let next = Arc::new(Mutex::new(first));
        let cancel = CancellationToken::new();

        info!(schedule = %schedule.expression(), next = ?first, "Recurring job registered");

        tokio::spawn(run_job(
            schedule.clone(),
            next.clone(),
            cancel.clone(),
            callback,
        ));

        Self {
            schedule,
            next,
            cancel,
        }
    }

    /// Upcoming fire time, `None` once the job has stopped
    pub fn next_invocation(&self) -> Option<DateTime<Utc>> {
        *lock(&self.next)
    }

    /// The schedule this job follows
    pub fn schedule(&self) -> &CronSchedule {
        &self.schedule
    }

    /// Stop the background task
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the job has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for RecurringJob {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_job<F>(
    schedule: CronSchedule,
    next: Arc<Mutex<Option<DateTime<Utc>>>>,
    cancel: CancellationToken,
    callback: F,
) where
    F: Fn() + Send + Sync + 'static,
{
    loop {
        let Some(fire_at) = *lock(&next) else {
            break;
        };

        let wait = (fire_at - Utc::now()).to_std().unwrap_or_default();
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        // The wall clock may lag the timer slightly; never hand out the same
        // fire time twice.
        let following = schedule.next_after(Utc::now().max(fire_at)).ok();
        *lock(&next) = following;

        debug!(schedule = %schedule.expression(), fired = %fire_at, next = ?following, "Recurring job fired");
        callback();
    }

    *lock(&next) = None;
    info!(schedule = %schedule.expression(), "Recurring job stopped");
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
