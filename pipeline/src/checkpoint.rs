//! Durable record of what has already been folded.
//!
//! Processed ids and the tallies they produced are written together in one
//! file, so a restart never sees an id marked done without its contribution.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use usage_stats::AggregateStore;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to read checkpoint {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse checkpoint {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write checkpoint {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Processed log ids plus the store they were folded into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub processed: BTreeSet<String>,
    #[serde(default)]
    pub store: AggregateStore,
}

impl Checkpoint {
    pub fn is_processed(&self, id: &str) -> bool {
        self.processed.contains(id)
    }
}

/// JSON checkpoint file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the checkpoint; a missing file is an empty checkpoint
    pub async fn load(&self) -> Result<Checkpoint, CheckpointError> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no checkpoint, starting fresh");
                return Ok(Checkpoint::default());
            }
            Err(source) => {
                return Err(CheckpointError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let checkpoint: Checkpoint =
            serde_json::from_str(&json).map_err(|source| CheckpointError::Parse {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!(
            path = %self.path.display(),
            processed = checkpoint.processed.len(),
            "loaded checkpoint"
        );
        Ok(checkpoint)
    }

    /// Replace the checkpoint atomically (write a sibling file, then rename)
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let write_err = |source: std::io::Error| CheckpointError::Write {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_vec(checkpoint).map_err(|e| write_err(e.into()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(write_err)?;

        tracing::debug!(
            path = %self.path.display(),
            processed = checkpoint.processed.len(),
            "saved checkpoint"
        );
        Ok(())
    }
}
