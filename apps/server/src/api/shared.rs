use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use simfolio_core::ingestion::{IngestionRun, RunStatus};

/// Response shape shared by the cron and forced-sync endpoints. `log` is
/// the finished run with its per-ticker breakdown.
#[derive(Debug, Serialize)]
pub struct RunEnvelope {
    pub success: bool,
    pub message: String,
    pub log: IngestionRun,
    pub timestamp: DateTime<Utc>,
}

pub fn run_response(run: IngestionRun) -> (StatusCode, Json<RunEnvelope>) {
    let (status, success) = match run.status {
        RunStatus::Completed => (StatusCode::OK, true),
        RunStatus::CompletedWithErrors => (StatusCode::OK, false),
        RunStatus::Failed | RunStatus::Running => (StatusCode::INTERNAL_SERVER_ERROR, false),
    };
    let envelope = RunEnvelope {
        success,
        message: run.summary_line(),
        log: run,
        timestamp: Utc::now(),
    };
    (status, Json(envelope))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simfolio_core::ingestion::{IngestionMode, RunTrigger, TickerOutcome};

    #[test]
    fn test_completed_with_errors_is_ok_but_not_success() {
        let mut run = IngestionRun::start(RunTrigger::Cron, IngestionMode::Incremental);
        run.record("PETR4", TickerOutcome::Updated { samples: 1 });
        run.record("VALE3", TickerOutcome::failed("Symbol not found"));
        run.finish();

        let (status, Json(envelope)) = run_response(run);
        assert_eq!(status, StatusCode::OK);
        assert!(!envelope.success);
        assert_eq!(envelope.log.failed_tickers(), vec!["VALE3"]);
        assert!(envelope.message.contains("completed-with-errors"));
    }

    #[test]
    fn test_failed_run_is_server_error() {
        let mut run = IngestionRun::start(RunTrigger::Forced, IngestionMode::Incremental);
        run.record("PETR4", TickerOutcome::failed("timeout"));
        run.abort("Circuit open");

        let (status, Json(envelope)) = run_response(run);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!envelope.success);
        assert!(envelope.message.contains("Aborted: Circuit open"));
    }
}
