//! What survives a synchronization round in the ledger.

use super::SyncReport;
use crate::error::StoreErrorKind;
use crate::ledger::{ChangeLedger, ChangeRecord};
use crate::remote::StoreLayout;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Ledger retention after a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerRetention {
    /// Drop everything that was drained, failed or not.
    #[default]
    DiscardAll,
    /// Put back records whose target file failed, ahead of newer records.
    RequeueFailed,
}

/// Apply `policy` to the records drained for `report`; returns how many were
/// requeued and stamps that count onto the report.
///
/// Locally rejected records are never requeued. The aggregate index is
/// rewritten every round, so its failure alone requeues nothing.
pub fn settle_ledger(
    ledger: &mut ChangeLedger,
    drained: Vec<ChangeRecord>,
    report: &mut SyncReport,
    layout: &StoreLayout,
    policy: LedgerRetention,
) -> usize {
    if policy == LedgerRetention::DiscardAll {
        report.requeued = 0;
        return 0;
    }

    let failed_remotely = |file: &str| {
        report.outcome(file).map_or(false, |o| {
            !o.is_success() && o.error_kind() != Some(StoreErrorKind::Validation)
        })
    };
    let retained: Vec<ChangeRecord> = drained
        .into_iter()
        .filter(|record| match record {
            ChangeRecord::Bulk { .. } => failed_remotely(&layout.list_path()),
            other => other
                .uuid()
                .map_or(false, |uuid| failed_remotely(&layout.resource_path(uuid))),
        })
        .collect();

    let count = retained.len();
    if count > 0 {
        info!(count, "requeueing records for failed files");
        ledger.requeue(retained);
    }
    report.requeued = count;
    count
}
