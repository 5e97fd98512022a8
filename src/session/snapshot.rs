//! Persistable session state

use crate::ledger::ChangeLedger;
use crate::lists::ListDocument;
use crate::resource::ResourceMap;
use crate::tree::CategoryTree;
use crate::types::{EpochMillis, Sha};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything needed to resume a session between CLI invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub resources: ResourceMap,
    #[serde(default)]
    pub ledger: ChangeLedger,
    #[serde(default)]
    pub tree: CategoryTree,
    #[serde(default)]
    pub tree_base_sha: Option<Sha>,
    #[serde(default)]
    pub tree_dirty: bool,
    #[serde(default)]
    pub lists: ListDocument,
    #[serde(default)]
    pub lists_dirty: bool,
    #[serde(default)]
    pub tags: Option<Value>,
    #[serde(default)]
    pub pulled_at: Option<EpochMillis>,
}
