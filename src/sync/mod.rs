//! Synchronization rounds
//!
//! A round replays drained ledger records against the remote store and
//! returns one `SyncReport` enumerating every file touched. Per-file errors are
//! captured in the report; the round itself always completes.

pub mod resources;
pub mod retention;

pub use resources::{ResourceSynchronizer, SyncPlan, SyncSnapshot};
pub use retention::{settle_ledger, LedgerRetention};

use crate::error::{StoreError, StoreErrorKind};
use crate::types::Sha;
use serde::Serialize;

/// What was attempted on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperation {
    Write,
    Delete,
    /// Record rejected locally; no remote call was made
    Validate,
}

/// Per-file result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Failed { kind: StoreErrorKind },
}

/// Outcome of one file operation within a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub file: String,
    pub operation: FileOperation,
    #[serde(flatten)]
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<Sha>,
}

impl FileOutcome {
    pub fn success(file: impl Into<String>, operation: FileOperation, sha: Option<Sha>) -> Self {
        Self {
            file: file.into(),
            operation,
            status: FileStatus::Success,
            message: None,
            sha,
        }
    }

    pub fn failure(file: impl Into<String>, operation: FileOperation, error: &StoreError) -> Self {
        Self {
            file: file.into(),
            operation,
            status: FileStatus::Failed { kind: error.kind() },
            message: Some(error.to_string()),
            sha: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }

    pub fn error_kind(&self) -> Option<StoreErrorKind> {
        match self.status {
            FileStatus::Success => None,
            FileStatus::Failed { kind } => Some(kind),
        }
    }
}

/// Aggregate result of a synchronization round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Number of ledger records consumed by the round
    pub records: usize,
    pub outcomes: Vec<FileOutcome>,
    /// Records put back into the ledger by the retention policy
    pub requeued: usize,
}

impl SyncReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.error_kind() == Some(StoreErrorKind::Conflict))
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_success)
    }

    pub fn outcome(&self, file: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.file == file)
    }

    pub fn title(&self) -> &'static str {
        if self.is_success() {
            "Sync succeeded"
        } else if self.succeeded().next().is_some() {
            "Sync partially succeeded"
        } else {
            "Sync failed"
        }
    }

    /// One consolidated message naming the files that succeeded and those
    /// that failed, with reasons.
    pub fn summary(&self) -> String {
        let mut out = String::from("Sync result:\n");
        let ok: Vec<&str> = self.succeeded().map(|o| o.file.as_str()).collect();
        if !ok.is_empty() {
            out.push_str(&format!("Succeeded: {}\n", ok.join(", ")));
        }
        let failed: Vec<String> = self
            .failed()
            .map(|o| {
                format!(
                    "{} ({})",
                    o.file,
                    o.message.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();
        if !failed.is_empty() {
            out.push_str(&format!("Failed: {}\n", failed.join(", ")));
        }
        if self.requeued > 0 {
            out.push_str(&format!("Requeued: {} record(s)\n", self.requeued));
        }
        out
    }
}
