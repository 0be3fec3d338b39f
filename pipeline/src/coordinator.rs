//! Drives logs through replay, weighting and aggregation.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use usage_battle::{BattleRecord, TrackError, replay};
use usage_protocol::Dex;
use usage_stats::AggregateStore;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::report::{Diagnostic, FailureKind, LogOutcome, RunReport, RunSummary};
use crate::source::{LogEntry, LogSource};

type Queue = Arc<Mutex<VecDeque<LogEntry>>>;

/// Read-only state every worker sees
struct Shared<S> {
    config: PipelineConfig,
    dex: Dex,
    source: S,
}

/// A replayed battle that passed every check, ready to fold
struct Prepared {
    tier: String,
    record: BattleRecord,
    /// p1 then p2
    weights: [f64; 2],
}

/// Processed ids and the tallies they produced, handed over together
#[derive(Default)]
struct Batch {
    store: AggregateStore,
    processed: Vec<String>,
}

/// Resumable, concurrent log to usage statistics run
pub struct Pipeline<S> {
    shared: Arc<Shared<S>>,
    checkpoint: Option<CheckpointStore>,
}

impl<S: LogSource> Pipeline<S> {
    /// Validates the configuration; nothing is fetched until [`Pipeline::run`]
    pub fn new(config: PipelineConfig, dex: Dex, source: S) -> Result<Self, PipelineError> {
        config.validate()?;
        let checkpoint = config.checkpoint_path.clone().map(CheckpointStore::new);

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                dex,
                source,
            }),
            checkpoint,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.shared.config
    }

    /// Process every log the source lists that is not already checkpointed
    ///
    /// Setting `shutdown` to `true` lets workers finish their current log and
    /// stop; whatever was folded up to then is still checkpointed. With
    /// `checkpoint_every` set, the checkpoint is also rewritten each time that
    /// many more logs have been handed back by the workers.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<RunSummary, PipelineError> {
        let mut checkpoint = match &self.checkpoint {
            Some(store) => store.load().await?,
            None => Checkpoint::default(),
        };

        let entries = self
            .shared
            .source
            .list()
            .await
            .map_err(PipelineError::Source)?;

        let mut report = RunReport::default();
        let mut seen = HashSet::new();
        let mut pending = VecDeque::with_capacity(entries.len());
        for entry in entries {
            if checkpoint.is_processed(&entry.id) || !seen.insert(entry.id.clone()) {
                tracing::debug!(log_id = %entry.id, "skipping already processed log");
                report.record(LogOutcome::SkippedDuplicate);
                continue;
            }
            pending.push_back(entry);
        }

        let workers = self.shared.config.workers;
        tracing::info!(
            queued = pending.len(),
            skipped = report.skipped,
            workers,
            "starting run"
        );

        let queue: Queue = Arc::new(Mutex::new(pending));
        let (batch_tx, mut batches) = mpsc::channel(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let shared = Arc::clone(&self.shared);
            let queue = Arc::clone(&queue);
            let shutdown = shutdown.clone();
            let batch_tx = batch_tx.clone();
            handles.push(tokio::spawn(async move {
                shared.work(worker, queue, shutdown, batch_tx).await
            }));
        }
        drop(batch_tx);

        let every = self.shared.config.checkpoint_every;
        let mut unsaved = 0;
        // Closes once every worker has returned
        while let Some(batch) = batches.recv().await {
            unsaved += batch.processed.len();
            checkpoint.store.merge(batch.store);
            checkpoint.processed.extend(batch.processed);

            if every > 0 && unsaved >= every {
                if let Some(checkpoint_store) = &self.checkpoint {
                    // Retried at the next save; the final one still fails the run
                    if let Err(e) = checkpoint_store.save(&checkpoint).await {
                        tracing::warn!(error = %e, "periodic checkpoint failed");
                    }
                }
                unsaved = 0;
            }
        }

        let mut failure = None;
        for handle in handles {
            match handle.await? {
                Ok(worker_report) => report.merge(worker_report),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        report.pending = queue.lock().await.len() as u64;
        report.cancelled = report.cancelled || report.pending > 0;

        if let Some(checkpoint_store) = &self.checkpoint {
            checkpoint_store.save(&checkpoint).await?;
        }

        tracing::info!(
            folded = report.folded,
            abandoned = report.abandoned_total(),
            skipped = report.skipped,
            pending = report.pending,
            cancelled = report.cancelled,
            "run finished"
        );

        Ok(RunSummary {
            report,
            store: checkpoint.store,
        })
    }
}

impl<S: LogSource> Shared<S> {
    async fn work(
        &self,
        worker: usize,
        queue: Queue,
        shutdown: watch::Receiver<bool>,
        batches: mpsc::Sender<Batch>,
    ) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();
        let mut batch = Batch::default();
        let every = self.config.checkpoint_every;

        loop {
            if *shutdown.borrow() {
                tracing::info!(worker, "shutdown requested, worker stopping");
                report.cancelled = true;
                break;
            }

            if every > 0 && batch.processed.len() >= every {
                hand_over(worker, &batches, std::mem::take(&mut batch)).await;
            }

            let Some(entry) = queue.lock().await.pop_front() else {
                break;
            };

            match self.process(&entry).await {
                Ok(prepared) => {
                    let battle = fold_battle(&entry.id, &prepared)?;
                    batch.store.merge(battle);

                    tracing::debug!(worker, log_id = %entry.id, tier = %prepared.tier, "folded log");
                    batch.processed.push(entry.id);
                    report.record(LogOutcome::Folded {
                        tier: prepared.tier,
                    });
                }
                Err(diagnostic) => {
                    tracing::warn!(
                        log_id = %diagnostic.log_id,
                        kind = %diagnostic.kind,
                        detail = %diagnostic.detail,
                        "abandoning log"
                    );
                    if !diagnostic.kind.is_transient() {
                        batch.processed.push(entry.id);
                    }
                    report.record(LogOutcome::Invalid(diagnostic));
                }
            }
        }

        hand_over(worker, &batches, batch).await;
        Ok(report)
    }

    /// Fetch, replay and classify one log
    async fn process(&self, entry: &LogEntry) -> Result<Prepared, Diagnostic> {
        let id = entry.id.as_str();
        let secs = self.config.fetch_timeout_secs;

        let text = match tokio::time::timeout(Duration::from_secs(secs), self.source.fetch(id)).await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(Diagnostic::new(id, FailureKind::Fetch, format!("{e:#}"))),
            Err(_) => {
                return Err(Diagnostic::new(
                    id,
                    FailureKind::Timeout,
                    format!("fetch took longer than {secs}s"),
                ));
            }
        };

        let record = replay(&text, &self.dex, self.config.tolerate_decode_errors).map_err(|e| {
            match e {
                TrackError::Decode(e) => Diagnostic::new(
                    id,
                    FailureKind::Decode,
                    format!("{}: {e}", e.kind.label()),
                ),
                TrackError::Structural(e) => {
                    Diagnostic::new(id, FailureKind::Structural, format!("{}: {e}", e.label()))
                }
            }
        })?;

        let Some(tier) = record.tier.clone().or_else(|| entry.tier_hint.clone()) else {
            return Err(Diagnostic::new(
                id,
                FailureKind::MissingTier,
                "no tier line and no tier hint",
            ));
        };

        let Some(settings) = self.config.tier(&tier) else {
            return Err(Diagnostic::new(
                id,
                FailureKind::UnknownTier,
                format!("tier {tier} is not configured"),
            ));
        };

        if record.turns < settings.min_turns {
            return Err(Diagnostic::new(
                id,
                FailureKind::TooShort,
                format!(
                    "ended on turn {}, {tier} needs {}",
                    record.turns, settings.min_turns
                ),
            ));
        }

        let weights = record
            .side_views()
            .map(|view| settings.weighting.weight(view.rating()));

        Ok(Prepared {
            tier,
            record,
            weights,
        })
    }
}

async fn hand_over(worker: usize, batches: &mpsc::Sender<Batch>, batch: Batch) {
    if batch.processed.is_empty() {
        return;
    }
    if batches.send(batch).await.is_err() {
        tracing::warn!(worker, "run is gone, batch dropped");
    }
}

/// Both sides of one battle, folded into a store of their own so a
/// rejected side never leaves the other half behind
fn fold_battle(log_id: &str, prepared: &Prepared) -> Result<AggregateStore, PipelineError> {
    let mut battle = AggregateStore::new();

    for (view, weight) in prepared.record.side_views().into_iter().zip(prepared.weights) {
        battle
            .fold(&prepared.tier, view, weight)
            .map_err(|error| PipelineError::Aggregation {
                log_id: log_id.to_string(),
                error,
            })?;
    }

    Ok(battle)
}
