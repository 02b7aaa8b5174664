//! Ingestion run model.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::DEFAULT_BACKFILL_YEARS;

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunTrigger {
    Cron,
    Forced,
    BulkBackfill,
}

impl std::fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cron => write!(f, "cron"),
            Self::Forced => write!(f, "forced"),
            Self::BulkBackfill => write!(f, "bulk-backfill"),
        }
    }
}

/// How much history a run pulls per ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IngestionMode {
    /// Latest quote only.
    Incremental,
    /// Daily series for `from..=to`.
    #[serde(rename_all = "camelCase")]
    FullBackfill { from: NaiveDate, to: NaiveDate },
}

impl IngestionMode {
    /// Backfill of the default depth ending at `today`.
    pub fn default_backfill(today: NaiveDate) -> Self {
        let from = today
            .checked_sub_months(Months::new(DEFAULT_BACKFILL_YEARS * 12))
            .unwrap_or(NaiveDate::MIN);
        IngestionMode::FullBackfill { from, to: today }
    }

    pub fn is_backfill(&self) -> bool {
        matches!(self, IngestionMode::FullBackfill { .. })
    }
}

/// Result for one ticker within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TickerOutcome {
    /// `samples` records were written.
    Updated { samples: usize },
    /// The stored records already matched the provider.
    Unchanged,
    /// Not attempted.
    Skipped { reason: String },
    Failed { reason: String },
}

impl TickerOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::CompletedWithErrors => write!(f, "completed-with-errors"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Per-outcome counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Price records written across all tickers.
    pub samples_written: usize,
}

/// One execution of the pipeline over a set of tickers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRun {
    pub id: String,
    pub trigger: RunTrigger,
    pub mode: IngestionMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub per_ticker_results: BTreeMap<String, TickerOutcome>,
    /// Run-level failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub summary: RunSummary,
}

impl IngestionRun {
    pub fn start(trigger: RunTrigger, mode: IngestionMode) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trigger,
            mode,
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::Running,
            per_ticker_results: BTreeMap::new(),
            error: None,
            summary: RunSummary::default(),
        }
    }

    pub fn record(&mut self, ticker: impl Into<String>, outcome: TickerOutcome) {
        self.per_ticker_results.insert(ticker.into(), outcome);
    }

    /// Marks the run failed for a run-level reason. Recorded per-ticker
    /// progress is kept.
    pub fn abort(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
        self.finish();
    }

    /// Computes the counters and the final status.
    pub fn finish(&mut self) {
        let mut summary = RunSummary {
            total: self.per_ticker_results.len(),
            ..RunSummary::default()
        };
        for outcome in self.per_ticker_results.values() {
            match outcome {
                TickerOutcome::Updated { samples } => {
                    summary.updated += 1;
                    summary.samples_written += samples;
                }
                TickerOutcome::Unchanged => summary.unchanged += 1,
                TickerOutcome::Skipped { .. } => summary.skipped += 1,
                TickerOutcome::Failed { .. } => summary.failed += 1,
            }
        }

        let attempted = summary.total - summary.skipped;
        self.status = if self.error.is_some() {
            RunStatus::Failed
        } else if summary.failed > 0 && summary.failed == attempted {
            RunStatus::Failed
        } else if summary.failed > 0 {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Completed
        };
        self.summary = summary;
        self.finished_at = Some(Utc::now());
    }

    /// Tickers that ended in `Failed`, in ticker order.
    pub fn failed_tickers(&self) -> Vec<&str> {
        self.per_ticker_results
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(ticker, _)| ticker.as_str())
            .collect()
    }

    /// One-line human summary for logs and API envelopes.
    pub fn summary_line(&self) -> String {
        let s = &self.summary;
        let mut line = format!(
            "Run {} ({}) {}: {} tickers, {} updated, {} unchanged, {} skipped, {} failed",
            self.id, self.trigger, self.status, s.total, s.updated, s.unchanged, s.skipped, s.failed
        );
        if let Some(error) = &self.error {
            line.push_str(&format!(". Aborted: {}", error));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(outcomes: Vec<(&str, TickerOutcome)>) -> IngestionRun {
        let mut run = IngestionRun::start(RunTrigger::Forced, IngestionMode::Incremental);
        for (ticker, outcome) in outcomes {
            run.record(ticker, outcome);
        }
        run.finish();
        run
    }

    #[test]
    fn test_all_ok_is_completed() {
        let run = run_with(vec![
            ("PETR4", TickerOutcome::Updated { samples: 1 }),
            ("VALE3", TickerOutcome::Unchanged),
        ]);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.summary.updated, 1);
        assert_eq!(run.summary.unchanged, 1);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_some_failed_is_completed_with_errors() {
        let run = run_with(vec![
            ("PETR4", TickerOutcome::Updated { samples: 1 }),
            ("VALE3", TickerOutcome::Updated { samples: 1 }),
            ("XXXX3", TickerOutcome::failed("symbol not found")),
        ]);
        assert_eq!(run.status, RunStatus::CompletedWithErrors);
        assert_eq!(run.failed_tickers(), vec!["XXXX3"]);
    }

    #[test]
    fn test_every_attempted_failed_is_failed() {
        let run = run_with(vec![
            ("AAAA3", TickerOutcome::failed("timeout")),
            ("BBBB3", TickerOutcome::failed("timeout")),
            ("CCCC3", TickerOutcome::skipped("not registered")),
        ]);
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.summary.skipped, 1);
    }

    #[test]
    fn test_only_skipped_is_completed() {
        let run = run_with(vec![("CCCC3", TickerOutcome::skipped("not registered"))]);
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[test]
    fn test_abort_keeps_progress() {
        let mut run = IngestionRun::start(RunTrigger::Cron, IngestionMode::Incremental);
        run.record("PETR4", TickerOutcome::Updated { samples: 1 });
        run.abort("storage unavailable");

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.summary.updated, 1);
        assert!(run.summary_line().contains("Aborted: storage unavailable"));
    }

    #[test]
    fn test_default_backfill_is_twenty_years() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert_eq!(
            IngestionMode::default_backfill(today),
            IngestionMode::FullBackfill {
                from: NaiveDate::from_ymd_opt(2004, 5, 10).unwrap(),
                to: today,
            }
        );
    }

    #[test]
    fn test_serialized_shape() {
        let run = run_with(vec![("PETR4", TickerOutcome::Updated { samples: 1 })]);
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["trigger"], "forced");
        assert_eq!(json["perTickerResults"]["PETR4"]["outcome"], "updated");
        assert_eq!(json["perTickerResults"]["PETR4"]["samples"], 1);
        assert!(json.get("error").is_none());
    }
}
