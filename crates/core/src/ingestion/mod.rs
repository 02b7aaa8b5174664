//! Ingestion module - runs that pull provider data into the price store.

mod ingestion_model;
mod ingestion_pipeline;

pub use ingestion_model::{
    IngestionMode, IngestionRun, RunStatus, RunSummary, RunTrigger, TickerOutcome,
};
pub use ingestion_pipeline::IngestionPipeline;
