//! Resource Synchronizer
//!
//! Replays drained records as whole-file operations: one file per resource,
//! the list document once if any bulk record was drained, and finally the
//! aggregate index snapshot. Records for the same uuid collapse into a single
//! operation carrying the last intent, which leaves the remote in the same
//! state as replaying them one by one.

use super::{FileOperation, FileOutcome, SyncReport};
use crate::concurrency::PathLockManager;
use crate::config::SyncOptions;
use crate::error::StoreError;
use crate::ledger::ChangeRecord;
use crate::lists::ListDocument;
use crate::remote::{encode_document, write_with_fresh_sha, RemoteStore, StoreLayout};
use crate::resource::{Resource, ResourceMap};
use crate::types::ResourceId;
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// In-memory state written alongside the per-record files.
#[derive(Debug, Clone, Copy)]
pub struct SyncSnapshot<'a> {
    pub resources: &'a ResourceMap,
    pub lists: &'a ListDocument,
}

/// Collapsed per-file operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedOp {
    Write {
        uuid: ResourceId,
        action: &'static str,
        data: Resource,
    },
    Delete {
        uuid: ResourceId,
    },
}

impl PlannedOp {
    pub fn uuid(&self) -> &str {
        match self {
            PlannedOp::Write { uuid, .. } | PlannedOp::Delete { uuid } => uuid,
        }
    }
}

/// Work derived from a drained ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    /// One entry per resource file, in first-appearance order
    pub file_ops: Vec<PlannedOp>,
    /// Records rejected before any remote call
    pub rejected: Vec<FileOutcome>,
    /// Whether the list document must be rewritten
    pub write_list: bool,
}

impl SyncPlan {
    pub fn build(records: &[ChangeRecord]) -> Self {
        let mut ops: IndexMap<ResourceId, PlannedOp> = IndexMap::new();
        let mut plan = SyncPlan::default();

        for (index, record) in records.iter().enumerate() {
            if let Err(e) = record.validate() {
                let label = format!("record #{} ({})", index + 1, record.action());
                plan.rejected
                    .push(FileOutcome::failure(label, FileOperation::Validate, &e));
                continue;
            }
            match record {
                ChangeRecord::Add { uuid, data } | ChangeRecord::Edit { uuid, data } => {
                    // A file created earlier in the same round is still a create.
                    let action = match (record, ops.get(uuid)) {
                        (ChangeRecord::Add { .. }, _) => "add",
                        (_, Some(PlannedOp::Write { action: "add", .. })) => "add",
                        _ => "edit",
                    };
                    ops.insert(
                        uuid.clone(),
                        PlannedOp::Write {
                            uuid: uuid.clone(),
                            action,
                            data: data.clone(),
                        },
                    );
                }
                ChangeRecord::Delete { uuid } => {
                    ops.insert(uuid.clone(), PlannedOp::Delete { uuid: uuid.clone() });
                }
                ChangeRecord::Bulk { .. } => plan.write_list = true,
            }
        }

        plan.file_ops = ops.into_values().collect();
        plan
    }
}

/// Replays ledger records against a remote store.
pub struct ResourceSynchronizer {
    store: Arc<dyn RemoteStore>,
    layout: StoreLayout,
    locks: Arc<PathLockManager>,
    options: SyncOptions,
}

impl ResourceSynchronizer {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        layout: StoreLayout,
        locks: Arc<PathLockManager>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            layout,
            locks,
            options,
        }
    }

    /// Run one round. Never fails as a whole: every file gets an outcome.
    pub async fn synchronize(&self, records: &[ChangeRecord], snapshot: SyncSnapshot<'_>) -> SyncReport {
        let plan = SyncPlan::build(records);
        info!(
            records = records.len(),
            files = plan.file_ops.len(),
            rejected = plan.rejected.len(),
            write_list = plan.write_list,
            "starting sync round"
        );

        let mut outcomes = plan.rejected.clone();
        let concurrency = self.options.max_concurrent_writes.max(1);
        let file_outcomes: Vec<FileOutcome> = stream::iter(plan.file_ops.iter())
            .map(|op| self.apply(op))
            .buffered(concurrency)
            .collect()
            .await;
        outcomes.extend(file_outcomes);

        if plan.write_list {
            let path = self.layout.list_path();
            outcomes.push(
                self.write_document(&path, snapshot.lists, "update list.json")
                    .await,
            );
        }

        let index_path = self.layout.resource_index_path();
        outcomes.push(
            self.write_document(&index_path, snapshot.resources, "sync uuid_resource_curd.json")
                .await,
        );

        for outcome in outcomes.iter().filter(|o| !o.is_success()) {
            warn!(
                file = %outcome.file,
                kind = ?outcome.error_kind(),
                message = outcome.message.as_deref().unwrap_or(""),
                "file sync failed"
            );
        }
        let report = SyncReport {
            records: records.len(),
            outcomes,
            requeued: 0,
        };
        info!(
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            "sync round finished"
        );
        report
    }

    async fn apply(&self, op: &PlannedOp) -> FileOutcome {
        match op {
            PlannedOp::Write { uuid, action, data } => {
                let path = self.layout.resource_path(uuid);
                let message = format!("{} resource {}", action, uuid);
                self.write_document(&path, data, &message).await
            }
            PlannedOp::Delete { uuid } => self.delete_resource(uuid).await,
        }
    }

    async fn write_document<T: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        value: &T,
        message: &str,
    ) -> FileOutcome {
        let content = match encode_document(path, value) {
            Ok(content) => content,
            Err(e) => return FileOutcome::failure(path, FileOperation::Write, &e),
        };
        let _guard = self.locks.lock(path).await;
        debug!(path, bytes = content.len(), "writing document");
        match write_with_fresh_sha(self.store.as_ref(), path, &content, message).await {
            Ok(receipt) => FileOutcome::success(path, FileOperation::Write, Some(receipt.sha)),
            Err(e) => FileOutcome::failure(path, FileOperation::Write, &e),
        }
    }

    async fn delete_resource(&self, uuid: &str) -> FileOutcome {
        let path = self.layout.resource_path(uuid);
        let _guard = self.locks.lock(&path).await;
        let message = format!("delete resource {}", uuid);
        match self.delete_if_present(&path, &message).await {
            Ok(true) => FileOutcome::success(&path, FileOperation::Delete, None),
            Ok(false) => FileOutcome::success(&path, FileOperation::Delete, None)
                .with_message("already absent"),
            Err(e) => FileOutcome::failure(&path, FileOperation::Delete, &e),
        }
    }

    async fn delete_if_present(&self, path: &str, message: &str) -> Result<bool, StoreError> {
        match self.store.current_sha(path).await? {
            Some(sha) => {
                self.store.delete_file(path, &sha, message).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
