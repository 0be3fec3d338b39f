//! Resumable usage statistics runs over Pokemon Showdown battle logs.
//!
//! # Overview
//!
//! ```text
//! LogSource (directory, memory)
//!        │ list / fetch
//!        ▼
//! Pipeline ── workers ── replay -> weight -> fold into a partial store
//!        │
//!        ▼
//! merged AggregateStore + RunReport, checkpointed
//! ```
//!
//! Logs already recorded in the checkpoint are skipped, so a crashed or
//! stopped run can be restarted over the same source without counting any
//! battle twice.
//!
//! # Example Usage
//!
//! ```ignore
//! use tokio::sync::watch;
//! use usage_pipeline::{DirectorySource, Pipeline, PipelineConfig};
//! use usage_protocol::Dex;
//!
//! let config = PipelineConfig::from_file("usage.json")?;
//! let pipeline = Pipeline::new(config, Dex::load("dex.json")?, DirectorySource::new("logs"))?;
//!
//! let (_stop, shutdown) = watch::channel(false);
//! let summary = pipeline.run(shutdown).await?;
//! println!("folded {} battles", summary.report.folded);
//! ```

pub mod checkpoint;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod report;
pub mod source;

pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use config::{ConfigError, PipelineConfig, TierConfig};
pub use coordinator::Pipeline;
pub use error::PipelineError;
pub use report::{Diagnostic, FailureKind, LogOutcome, RunReport, RunSummary};
pub use source::{DirectorySource, LogEntry, LogSource, MemorySource};
