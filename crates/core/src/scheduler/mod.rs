//! Scheduler module - single-run-at-a-time coordination of ingestion runs.

mod scheduler_model;
mod scheduler_service;

pub use scheduler_model::{RunRequest, SchedulerState, SchedulerStatus, TickerSelection};
pub use scheduler_service::Scheduler;
