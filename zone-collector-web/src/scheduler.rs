//! Periodic sync trigger.
//!
//! A background task sleeps until the next configured UTC hour and starts a
//! full sync. A trigger that lands while a run is still active is skipped
//! with a log line; the single-flight check in the orchestrator decides.

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use zone_collector_core::services::SyncService;

/// Hold-off after a trigger so one slot never fires twice.
const POST_TRIGGER_HOLDOFF: Duration = Duration::from_secs(60);

/// Handle onto the scheduler task, exposing its state to `/health`.
#[derive(Clone)]
pub struct Scheduler {
    next_run: Arc<RwLock<Option<DateTime<Utc>>>>,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    fn disabled() -> Self {
        Self {
            next_run: Arc::new(RwLock::new(None)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn next_run_time(&self) -> Option<DateTime<Utc>> {
        self.next_run.read().ok().and_then(|guard| *guard)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Start the scheduler for the given UTC hours (empty list disables it).
pub fn start(sync_service: Arc<SyncService>, hours: &[u32]) -> Scheduler {
    let mut hours: Vec<u32> = hours.iter().copied().filter(|hour| *hour < 24).collect();
    hours.sort_unstable();
    hours.dedup();

    if hours.is_empty() {
        tracing::warn!("No valid schedule hours configured, scheduler disabled");
        return Scheduler::disabled();
    }

    let scheduler = Scheduler {
        next_run: Arc::new(RwLock::new(None)),
        running: Arc::new(AtomicBool::new(true)),
    };

    for hour in &hours {
        tracing::info!("Scheduled zone sync at {hour:02}:00 (UTC)");
    }

    let next_run = Arc::clone(&scheduler.next_run);
    tokio::spawn(async move {
        loop {
            let next = compute_next_run(Utc::now(), &hours);
            if let Ok(mut guard) = next_run.write() {
                *guard = Some(next);
            }
            tracing::info!("Next scheduled zone sync at {next}");

            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match sync_service.start_sync(None).await {
                Ok(sync_id) => tracing::info!("Scheduled sync started with id: {sync_id}"),
                Err(e) => tracing::warn!("Scheduled sync skipped: {e}"),
            }

            tokio::time::sleep(POST_TRIGGER_HOLDOFF).await;
        }
    });

    scheduler
}

/// The earliest configured hour strictly after `now` (today or tomorrow).
fn compute_next_run(now: DateTime<Utc>, hours: &[u32]) -> DateTime<Utc> {
    let today = now.date_naive();
    for hour in hours {
        let time = NaiveTime::from_hms_opt(*hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let candidate = today.and_time(time).and_utc();
        if candidate > now {
            return candidate;
        }
    }
    let first = hours.first().copied().unwrap_or(0);
    let time = NaiveTime::from_hms_opt(first, 0, 0).unwrap_or(NaiveTime::MIN);
    (today + chrono::Duration::days(1)).and_time(time).and_utc()
}
