use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ingestion::{IngestionMode, IngestionRun, RunTrigger};

/// Scheduler state. At most one run is `Running` per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SchedulerState {
    Idle,
    #[serde(rename_all = "camelCase")]
    Running {
        run_id: String,
        trigger: RunTrigger,
        started_at: DateTime<Utc>,
    },
}

/// Which tickers a run covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TickerSelection {
    /// Every active asset at the time the run starts.
    All,
    Only(Vec<String>),
}

/// A request to start a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub trigger: RunTrigger,
    pub tickers: TickerSelection,
    pub mode: IngestionMode,
}

impl RunRequest {
    /// Daily incremental update over all active assets.
    pub fn cron() -> Self {
        Self {
            trigger: RunTrigger::Cron,
            tickers: TickerSelection::All,
            mode: IngestionMode::Incremental,
        }
    }

    /// Operator-triggered incremental update.
    pub fn forced(tickers: TickerSelection) -> Self {
        Self {
            trigger: RunTrigger::Forced,
            tickers,
            mode: IngestionMode::Incremental,
        }
    }

    /// Historical backfill. `from` defaults to twenty years before `to`, `to`
    /// defaults to today. Covering all assets is a bulk backfill.
    pub fn backfill(tickers: TickerSelection, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let to = to.unwrap_or_else(|| Utc::now().date_naive());
        let mode = match from {
            Some(from) => IngestionMode::FullBackfill { from, to },
            None => IngestionMode::default_backfill(to),
        };
        let trigger = match tickers {
            TickerSelection::All => RunTrigger::BulkBackfill,
            TickerSelection::Only(_) => RunTrigger::Forced,
        };
        Self {
            trigger,
            tickers,
            mode,
        }
    }
}

/// Snapshot returned by `Scheduler::status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub last_run: Option<IngestionRun>,
}

impl SchedulerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }
}
