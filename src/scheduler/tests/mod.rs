use super::*;
use chrono::{TimeZone, Timelike};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[test]
fn test_parse_hourly_schedule() {
    let schedule = CronSchedule::parse("0 * * * *").unwrap();
    assert_eq!(schedule.expression(), "0 * * * *");
}

#[test]
fn test_parse_rejects_garbage() {
    match CronSchedule::parse("whenever") {
        Err(Error::Config { key, message }) => {
            assert_eq!(key.as_deref(), Some("schedule"));
            assert!(message.contains("whenever"));
        }
        other => panic!("expected config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_next_after_hourly_lands_on_top_of_hour() {
    let schedule = CronSchedule::parse("0 * * * *").unwrap();
    let after = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();

    let next = schedule.next_after(after).unwrap();

    assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap());
}

#[test]
fn test_next_after_is_strictly_after() {
    let schedule = CronSchedule::parse("0 * * * *").unwrap();
    let on_the_hour = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap();

    let next = schedule.next_after(on_the_hour).unwrap();

    assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap());
}

#[test]
fn test_schedule_equality_by_expression() {
    let a = CronSchedule::parse("0 * * * *").unwrap();
    let b = CronSchedule::parse("0 * * * *").unwrap();
    let c = CronSchedule::parse("30 2 * * *").unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[tokio::test]
async fn test_register_exposes_next_invocation() {
    let schedule = CronSchedule::parse("0 * * * *").unwrap();
    let before = Utc::now();

    let job = RecurringJob::register(schedule, || {});
    let next = job.next_invocation().unwrap();

    assert!(next > before);
    assert_eq!(next.minute(), 0);
    assert_eq!(next.second(), 0);
    assert!(next - before <= chrono::TimeDelta::hours(1));
}

#[tokio::test(start_paused = true)]
async fn test_job_fires_repeatedly() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();

    let schedule = CronSchedule::parse("* * * * *").unwrap();
    let _job = RecurringJob::register(schedule, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let waited = tokio::time::timeout(Duration::from_secs(600), async {
        while fired.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    })
    .await;

    assert!(waited.is_ok(), "job should fire at least twice");
}

#[tokio::test(start_paused = true)]
async fn test_next_invocation_advances_before_callback() {
    let schedule = CronSchedule::parse("* * * * *").unwrap();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let job = Arc::new(Mutex::new(None::<Arc<Mutex<Option<DateTime<Utc>>>>>));

    let seen = observed.clone();
    let shared_next = job.clone();
    let handle = RecurringJob::register(schedule, move || {
        if let Some(next) = lock(&shared_next).as_ref() {
            lock(&seen).push(*lock(next));
        }
    });
    let first = handle.next_invocation().unwrap();
    *lock(&job) = Some(handle.next.clone());

    tokio::time::timeout(Duration::from_secs(600), async {
        while lock(&observed).is_empty() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    })
    .await
    .unwrap();

    let seen_next = lock(&observed)[0].unwrap();
    assert!(seen_next > first, "callback must see the following fire time");
}

#[tokio::test]
async fn test_cancel_stops_job() {
    let schedule = CronSchedule::parse("* * * * *").unwrap();
    let job = RecurringJob::register(schedule, || {});

    assert!(!job.is_cancelled());
    job.cancel();
    assert!(job.is_cancelled());

    tokio::time::timeout(Duration::from_secs(1), async {
        while job.next_invocation().is_some() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("cancelled job should clear its next invocation");
}
