//! Background daily price update.
//!
//! Sleeps until the configured UTC hour, then runs the same cron path the
//! `/cron/update-prices` endpoint uses. Overlaps with an external cron call
//! are rejected by the core scheduler and only logged here.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use simfolio_core::errors::Error as CoreError;
use simfolio_core::scheduler::RunRequest;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::main_lib::AppState;

/// Time left until the next `hour_utc:00:00`, strictly in the future.
pub fn duration_until_next(now: DateTime<Utc>, hour_utc: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour_utc.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date_naive().and_time(at).and_utc();
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Starts the daily update loop.
pub fn start_daily_sync_scheduler(state: Arc<AppState>, hour_utc: u32) {
    tokio::spawn(async move {
        info!("Daily price sync scheduler started ({:02}:00 UTC)", hour_utc);

        loop {
            let wait = duration_until_next(Utc::now(), hour_utc);
            info!("Next daily price sync in {}s", wait.as_secs());
            tokio::time::sleep(wait).await;
            run_scheduled_sync(&state).await;
        }
    });
}

async fn run_scheduled_sync(state: &Arc<AppState>) {
    match state.scheduler.force_update(RunRequest::cron()).await {
        Ok(run) => info!("Scheduled price sync finished: {}", run.summary_line()),
        Err(CoreError::RunInProgress { run_id }) => {
            info!("Scheduled price sync skipped: run {} in progress", run_id)
        }
        Err(e) => warn!("Scheduled price sync failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(
            duration_until_next(now, 22),
            Duration::from_secs(11 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        assert_eq!(duration_until_next(now, 22), Duration::from_secs(24 * 3600));

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 23, 15, 0).unwrap();
        assert_eq!(
            duration_until_next(now, 22),
            Duration::from_secs(22 * 3600 + 45 * 60)
        );
    }
}
