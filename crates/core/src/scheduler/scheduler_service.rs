//! Run coordinator. Owns the "run in progress" state for the process.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{error, info, warn};

use super::scheduler_model::{RunRequest, SchedulerState, SchedulerStatus, TickerSelection};
use crate::assets::AssetServiceTrait;
use crate::errors::{Error, Result};
use crate::ingestion::{IngestionPipeline, IngestionRun, RunTrigger};

#[derive(Debug)]
struct Inner {
    state: SchedulerState,
    last_run: Option<IngestionRun>,
}

pub struct Scheduler {
    pipeline: Arc<IngestionPipeline>,
    assets: Arc<dyn AssetServiceTrait>,
    inner: Arc<Mutex<Inner>>,
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| {
        warn!("Scheduler mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Puts the scheduler back to `Idle` when dropped, so a panicking run does
/// not leave the state stuck in `Running`.
struct RunGuard {
    inner: Arc<Mutex<Inner>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock_inner(&self.inner).state = SchedulerState::Idle;
    }
}

impl Scheduler {
    pub fn new(pipeline: Arc<IngestionPipeline>, assets: Arc<dyn AssetServiceTrait>) -> Self {
        Self {
            pipeline,
            assets,
            inner: Arc::new(Mutex::new(Inner {
                state: SchedulerState::Idle,
                last_run: None,
            })),
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        let inner = lock_inner(&self.inner);
        SchedulerStatus {
            state: inner.state.clone(),
            last_run: inner.last_run.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(lock_inner(&self.inner).state, SchedulerState::Running { .. })
    }

    /// Runs `request` to completion.
    ///
    /// Fails immediately with `Error::RunInProgress` while another run holds
    /// the scheduler. The run itself executes on its own task: dropping the
    /// returned future does not cancel it, and the finished run, including a
    /// failed one, is always kept as `last_run`.
    pub async fn force_update(&self, request: RunRequest) -> Result<IngestionRun> {
        let mut run = IngestionRun::start(request.trigger, request.mode);
        {
            let mut inner = lock_inner(&self.inner);
            if let SchedulerState::Running { run_id, .. } = &inner.state {
                return Err(Error::RunInProgress {
                    run_id: run_id.clone(),
                });
            }
            inner.state = SchedulerState::Running {
                run_id: run.id.clone(),
                trigger: run.trigger,
                started_at: run.started_at,
            };
        }
        let guard = RunGuard {
            inner: self.inner.clone(),
        };
        let tickers = self.resolve_tickers(&request.tickers);
        let pipeline = self.pipeline.clone();

        let handle = tokio::spawn(async move {
            match tickers {
                Ok(tickers) => pipeline.execute(&mut run, &tickers).await,
                Err(e) => {
                    error!("Run {} could not resolve tickers: {}", run.id, e);
                    run.abort(e.to_string());
                }
            }

            if run.trigger == RunTrigger::Cron {
                match serde_json::to_string(&run) {
                    Ok(json) => info!("Cron run finished: {}", json),
                    Err(e) => warn!("Failed to serialize cron run summary: {}", e),
                }
            }

            lock_inner(&guard.inner).last_run = Some(run.clone());
            drop(guard);
            run
        });

        handle.await.map_err(|e| {
            error!("Ingestion run task failed: {}", e);
            Error::Unexpected(format!("ingestion run task failed: {}", e))
        })
    }

    fn resolve_tickers(&self, selection: &TickerSelection) -> Result<Vec<String>> {
        match selection {
            TickerSelection::All => Ok(self
                .assets
                .list_active()?
                .into_iter()
                .map(|asset| asset.ticker)
                .collect()),
            TickerSelection::Only(tickers) => Ok(tickers.clone()),
        }
    }
}
