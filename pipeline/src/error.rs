//! Errors that stop a run

use thiserror::Error;
use usage_stats::AggregationError;

use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;

/// A run-level failure; per-log problems are diagnostics instead
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("aggregation failed for {log_id}: {error}")]
    Aggregation {
        log_id: String,
        error: AggregationError,
    },

    #[error("log source failed: {0:#}")]
    Source(anyhow::Error),

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
