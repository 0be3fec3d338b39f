//! Per-log outcomes and the end-of-run report.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use usage_stats::{AggregateStore, Snapshot};

/// Why a log was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Fetch,
    Timeout,
    Decode,
    Structural,
    MissingTier,
    UnknownTier,
    TooShort,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Fetch => "fetch",
            FailureKind::Timeout => "timeout",
            FailureKind::Decode => "decode",
            FailureKind::Structural => "structural",
            FailureKind::MissingTier => "missing_tier",
            FailureKind::UnknownTier => "unknown_tier",
            FailureKind::TooShort => "too_short",
        }
    }

    /// Failures of the source rather than the log; retried on the next run
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::Fetch | FailureKind::Timeout)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured record of one abandoned log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub log_id: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(log_id: &str, kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            log_id: log_id.to_string(),
            kind,
            detail: detail.into(),
        }
    }
}

/// How one log was classified
#[derive(Debug, Clone, PartialEq)]
pub enum LogOutcome {
    /// Both sides folded under this tier
    Folded { tier: String },
    Invalid(Diagnostic),
    SkippedDuplicate,
}

/// Counts for a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub folded: u64,
    pub abandoned: BTreeMap<FailureKind, u64>,
    pub skipped: u64,
    /// Logs never attempted because the run was stopped
    pub pending: u64,
    pub diagnostics: Vec<Diagnostic>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn record(&mut self, outcome: LogOutcome) {
        match outcome {
            LogOutcome::Folded { .. } => self.folded += 1,
            LogOutcome::Invalid(diagnostic) => {
                *self.abandoned.entry(diagnostic.kind).or_default() += 1;
                self.diagnostics.push(diagnostic);
            }
            LogOutcome::SkippedDuplicate => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: RunReport) {
        self.folded += other.folded;
        for (kind, count) in other.abandoned {
            *self.abandoned.entry(kind).or_default() += count;
        }
        self.skipped += other.skipped;
        self.pending += other.pending;
        self.diagnostics.extend(other.diagnostics);
        self.cancelled |= other.cancelled;
    }

    pub fn abandoned_total(&self) -> u64 {
        self.abandoned.values().sum()
    }

    pub fn abandoned_count(&self, kind: FailureKind) -> u64 {
        self.abandoned.get(&kind).copied().unwrap_or(0)
    }
}

/// Report plus the merged tallies of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: RunReport,
    pub store: AggregateStore,
}

impl RunSummary {
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }
}
