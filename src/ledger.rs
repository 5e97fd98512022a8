//! Change Buffer
//!
//! Append-only, session-owned ledger of pending mutation intents. Records are
//! kept in causal order with no coalescing: it is a replay log. `drain` is the
//! only way to obtain-and-clear the contents.

use crate::error::StoreError;
use crate::lists::Bucket;
use crate::resource::{validate_resource, validate_resource_id, Resource};
use crate::types::ResourceId;
use serde::{Deserialize, Serialize};

/// One pending mutation intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ChangeRecord {
    Add { uuid: ResourceId, data: Resource },
    Edit { uuid: ResourceId, data: Resource },
    Delete { uuid: ResourceId },
    Bulk { operation: Bucket, uuids: Vec<ResourceId> },
}

impl ChangeRecord {
    pub fn action(&self) -> &'static str {
        match self {
            ChangeRecord::Add { .. } => "add",
            ChangeRecord::Edit { .. } => "edit",
            ChangeRecord::Delete { .. } => "delete",
            ChangeRecord::Bulk { .. } => "bulk",
        }
    }

    /// Resource targeted by an add/edit/delete record.
    pub fn uuid(&self) -> Option<&str> {
        match self {
            ChangeRecord::Add { uuid, .. }
            | ChangeRecord::Edit { uuid, .. }
            | ChangeRecord::Delete { uuid } => Some(uuid),
            ChangeRecord::Bulk { .. } => None,
        }
    }

    /// Check the record is well formed before any remote call.
    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            ChangeRecord::Add { uuid, data } | ChangeRecord::Edit { uuid, data } => {
                validate_resource(uuid, data)
            }
            ChangeRecord::Delete { uuid } => validate_resource_id(uuid),
            ChangeRecord::Bulk { uuids, .. } => uuids
                .iter()
                .try_for_each(|uuid| validate_resource_id(uuid)),
        }
    }
}

/// Session-scoped ledger of pending changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLedger {
    records: Vec<ChangeRecord>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_add(&mut self, uuid: &str, data: Resource) -> Result<(), StoreError> {
        self.push(ChangeRecord::Add {
            uuid: uuid.to_string(),
            data,
        })
    }

    pub fn record_edit(&mut self, uuid: &str, data: Resource) -> Result<(), StoreError> {
        self.push(ChangeRecord::Edit {
            uuid: uuid.to_string(),
            data,
        })
    }

    pub fn record_delete(&mut self, uuid: &str) -> Result<(), StoreError> {
        self.push(ChangeRecord::Delete {
            uuid: uuid.to_string(),
        })
    }

    pub fn record_bulk(&mut self, operation: Bucket, uuids: Vec<ResourceId>) -> Result<(), StoreError> {
        self.push(ChangeRecord::Bulk { operation, uuids })
    }

    fn push(&mut self, record: ChangeRecord) -> Result<(), StoreError> {
        record.validate()?;
        self.records.push(record);
        Ok(())
    }

    /// Take every pending record in causal order, leaving the ledger empty.
    pub fn drain(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.records)
    }

    /// Put records back at the front of the ledger, ahead of anything
    /// recorded since they were drained.
    pub(crate) fn requeue(&mut self, mut records: Vec<ChangeRecord>) {
        records.append(&mut self.records);
        self.records = records;
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
