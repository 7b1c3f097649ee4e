//! Daily trigger for the expiry check.
//!
//! One run per day at a fixed UTC time of day. Runs never overlap: the loop
//! awaits each run before computing the next fire time.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use kitwatch_alerts::{NotificationDispatcher, SnapshotReader};

use crate::runner::ExpiryCheckRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    /// UTC time of day.
    pub at: NaiveTime,
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self {
            at: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
        }
    }
}

impl DailySchedule {
    pub fn at(at: NaiveTime) -> Self {
        Self { at }
    }

    /// First fire time strictly after `now`.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            return today;
        }
        now.date_naive()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(self.at).and_utc())
            .unwrap_or(today)
    }

    /// Spawn the daily loop on the current tokio runtime.
    pub fn spawn<R, D>(self, runner: Arc<ExpiryCheckRunner<R, D>>) -> ScheduleHandle
    where
        R: SnapshotReader + 'static,
        D: NotificationDispatcher,
    {
        self.spawn_with_clock(runner, Utc::now)
    }

    /// Like [`DailySchedule::spawn`], reading wall-clock time from `clock`.
    pub fn spawn_with_clock<R, D, C>(
        self,
        runner: Arc<ExpiryCheckRunner<R, D>>,
        clock: C,
    ) -> ScheduleHandle
    where
        R: SnapshotReader + 'static,
        D: NotificationDispatcher,
        C: Fn() -> DateTime<Utc> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(schedule_loop(self, runner, clock, shutdown_rx));
        ScheduleHandle {
            shutdown: shutdown_tx,
            join,
        }
    }
}

/// Handle for the running schedule (graceful shutdown).
#[derive(Debug)]
pub struct ScheduleHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ScheduleHandle {
    /// Stop the loop. A run already in progress finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "daily expiry schedule ended abnormally");
        }
    }
}

async fn schedule_loop<R, D, C>(
    schedule: DailySchedule,
    runner: Arc<ExpiryCheckRunner<R, D>>,
    clock: C,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    R: SnapshotReader + 'static,
    D: NotificationDispatcher,
    C: Fn() -> DateTime<Utc>,
{
    info!(at = %schedule.at, "daily expiry schedule started");

    loop {
        let now = clock();
        let fire_at = schedule.next_fire_after(now);
        let wait = (fire_at - now).to_std().unwrap_or_default();
        info!(next_run = %fire_at, "waiting for next scheduled run");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown_rx.changed() => break,
        }

        match runner.run_once(fire_at.date_naive()).await {
            Ok(report) => info!(
                run_id = %report.run_id,
                delivered = report.delivered(),
                failed = report.failed(),
                "scheduled run finished"
            ),
            // The next scheduled run is the only retry.
            Err(e) => error!(error = %e, "scheduled run failed"),
        }

        if *shutdown_rx.borrow() {
            break;
        }
    }

    info!("daily expiry schedule stopped");
}
