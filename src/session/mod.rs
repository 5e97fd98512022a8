//! Admin session
//!
//! One editing session over the remote catalog: the resource map, the change
//! ledger, the category tree and the list buckets. All mutation is local and
//! synchronous; remote I/O only happens in `load`, `synchronize` and
//! `save_categories`.

pub mod snapshot;

pub use snapshot::SessionSnapshot;

use crate::concurrency::PathLockManager;
use crate::config::SyncOptions;
use crate::error::{ApiError, StoreError};
use crate::ledger::ChangeLedger;
use crate::lists::{AssignOutcome, Bucket, ListBucketCurator, ListDocument, StaleEntry};
use crate::remote::{fetch_json, RemoteStore, StoreLayout};
use crate::resource::{mint_resource_id, validate_resource, Resource, ResourceMap};
use crate::sync::{settle_ledger, ResourceSynchronizer, SyncReport, SyncSnapshot};
use crate::tree::{CategoryTreeEditor, SaveOutcome};
use crate::types::{now_millis, EpochMillis, ResourceId};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Pending-work summary for `status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub resources: usize,
    pub pending_records: usize,
    pub pending_adds: usize,
    pub pending_edits: usize,
    pub pending_deletes: usize,
    pub pending_bulk: usize,
    pub categories_dirty: bool,
    pub lists_dirty: bool,
    pub stale_list_entries: usize,
    pub pulled_at: Option<EpochMillis>,
}

pub struct AdminSession {
    layout: StoreLayout,
    options: SyncOptions,
    locks: Arc<PathLockManager>,
    ledger: ChangeLedger,
    resources: ResourceMap,
    categories: CategoryTreeEditor,
    lists: ListBucketCurator,
    tags: Option<Value>,
    pulled_at: Option<EpochMillis>,
}

impl AdminSession {
    /// Empty session; nothing has been read from the remote.
    pub fn new(layout: StoreLayout, options: SyncOptions) -> Self {
        Self {
            layout,
            options,
            locks: Arc::new(PathLockManager::new()),
            ledger: ChangeLedger::new(),
            resources: ResourceMap::new(),
            categories: CategoryTreeEditor::default(),
            lists: ListBucketCurator::default(),
            tags: None,
            pulled_at: None,
        }
    }

    /// Read the index, tree, list and tag documents. Absent documents start
    /// empty.
    pub async fn load(
        store: &dyn RemoteStore,
        layout: StoreLayout,
        options: SyncOptions,
    ) -> Result<Self, StoreError> {
        let index_path = layout.resource_index_path();
        let tree_path = layout.category_tree_path();
        let list_path = layout.list_path();
        let tags_path = layout.tags_path();

        let (resources, categories, lists, tags) = futures::try_join!(
            fetch_json::<ResourceMap>(store, &index_path),
            CategoryTreeEditor::load(store, &tree_path),
            fetch_json::<ListDocument>(store, &list_path),
            fetch_json::<Value>(store, &tags_path),
        )?;

        let mut session = Self::new(layout, options);
        session.resources = resources.map(|(map, _)| map).unwrap_or_default();
        session.categories = categories;
        session.lists = ListBucketCurator::new(lists.map(|(doc, _)| doc).unwrap_or_default());
        session.tags = tags.map(|(value, _)| value);
        session.pulled_at = Some(now_millis());
        info!(
            resources = session.resources.len(),
            categories = session.categories.tree().roots.len(),
            "session loaded"
        );
        Ok(session)
    }

    /// Rebuild a session from persisted local state.
    pub fn from_snapshot(layout: StoreLayout, options: SyncOptions, snapshot: SessionSnapshot) -> Self {
        let mut session = Self::new(layout, options);
        session.resources = snapshot.resources;
        session.ledger = snapshot.ledger;
        session.categories =
            CategoryTreeEditor::restore(snapshot.tree, snapshot.tree_base_sha, snapshot.tree_dirty);
        session.lists = ListBucketCurator::restore(snapshot.lists, snapshot.lists_dirty);
        session.tags = snapshot.tags;
        session.pulled_at = snapshot.pulled_at;
        session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            resources: self.resources.clone(),
            ledger: self.ledger.clone(),
            tree: self.categories.tree().clone(),
            tree_base_sha: self.categories.base_sha().map(str::to_string),
            tree_dirty: self.categories.is_dirty(),
            lists: self.lists.document().clone(),
            lists_dirty: self.lists.is_dirty(),
            tags: self.tags.clone(),
            pulled_at: self.pulled_at,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn resources(&self) -> &ResourceMap {
        &self.resources
    }

    pub fn resource(&self, uuid: &str) -> Option<&Resource> {
        self.resources.get(uuid)
    }

    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    pub fn categories(&self) -> &CategoryTreeEditor {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut CategoryTreeEditor {
        &mut self.categories
    }

    pub fn lists(&self) -> &ListBucketCurator {
        &self.lists
    }

    /// Tag document as read from the remote; never written back.
    pub fn tags(&self) -> Option<&Value> {
        self.tags.as_ref()
    }

    /// Whether anything local has not reached the remote yet.
    pub fn has_unsynced_changes(&self) -> bool {
        !self.ledger.is_empty() || self.categories.is_dirty() || self.lists.is_dirty()
    }

    /// Create a resource under a freshly minted uuid.
    pub fn add_resource(&mut self, mut data: Resource) -> Result<ResourceId, ApiError> {
        let uuid = mint_resource_id();
        let now = now_millis();
        data.uploaded = now;
        data.update_time = now;
        validate_resource(&uuid, &data)?;
        self.ledger.record_add(&uuid, data.clone())?;
        self.resources.insert(uuid.clone(), data);
        debug!(uuid = %uuid, "resource added");
        Ok(uuid)
    }

    /// Replace a resource's content. `uploaded` is kept from the existing
    /// entry whatever the payload says, and `update_time` always moves past
    /// the previous value even within the same millisecond.
    pub fn edit_resource(&mut self, uuid: &str, mut data: Resource) -> Result<(), ApiError> {
        let existing = self
            .resources
            .get(uuid)
            .ok_or_else(|| ApiError::ResourceNotFound(uuid.to_string()))?;
        data.uploaded = existing.uploaded;
        data.update_time = now_millis().max(existing.update_time.saturating_add(1));
        self.ledger.record_edit(uuid, data.clone())?;
        self.resources.insert(uuid.to_string(), data);
        debug!(uuid, "resource edited");
        Ok(())
    }

    pub fn delete_resource(&mut self, uuid: &str) -> Result<Resource, ApiError> {
        if !self.resources.contains_key(uuid) {
            return Err(ApiError::ResourceNotFound(uuid.to_string()));
        }
        self.ledger.record_delete(uuid)?;
        let removed = self
            .resources
            .shift_remove(uuid)
            .ok_or_else(|| ApiError::ResourceNotFound(uuid.to_string()))?;
        debug!(uuid, "resource deleted");
        Ok(removed)
    }

    /// Add resources to a bucket and record the list change.
    pub fn bulk_assign(
        &mut self,
        bucket: Bucket,
        uuids: &[ResourceId],
    ) -> Result<Vec<(ResourceId, AssignOutcome)>, ApiError> {
        let outcomes = self.lists.assign_many(bucket, uuids, &self.resources);
        self.ledger.record_bulk(bucket, uuids.to_vec())?;
        Ok(outcomes)
    }

    pub fn stale_list_entries(&self) -> Vec<StaleEntry> {
        self.lists.stale_entries(&self.resources)
    }

    /// Drop bucket entries whose resource no longer exists and record one
    /// bulk change per affected bucket.
    pub fn prune_stale_list_entries(&mut self) -> Result<Vec<StaleEntry>, ApiError> {
        let pruned = self.lists.prune_stale(&self.resources);
        for bucket in Bucket::ALL {
            let uuids: Vec<ResourceId> = pruned
                .iter()
                .filter(|entry| entry.bucket == bucket)
                .map(|entry| entry.uuid.clone())
                .collect();
            if !uuids.is_empty() {
                self.ledger.record_bulk(bucket, uuids)?;
            }
        }
        Ok(pruned)
    }

    /// Drain the ledger and replay it against the remote.
    pub async fn synchronize(&mut self, store: Arc<dyn RemoteStore>) -> SyncReport {
        let drained = self.ledger.drain();
        let synchronizer = ResourceSynchronizer::new(
            store,
            self.layout.clone(),
            self.locks.clone(),
            self.options.clone(),
        );
        let mut report = synchronizer
            .synchronize(
                &drained,
                SyncSnapshot {
                    resources: &self.resources,
                    lists: self.lists.document(),
                },
            )
            .await;

        if report
            .outcome(&self.layout.list_path())
            .is_some_and(|o| o.is_success())
        {
            self.lists.mark_clean();
        }
        settle_ledger(
            &mut self.ledger,
            drained,
            &mut report,
            &self.layout,
            self.options.retention,
        );
        report
    }

    /// Write the category tree, conditioned on the sha it was loaded at.
    pub async fn save_categories(&mut self, store: &dyn RemoteStore) -> Result<SaveOutcome, StoreError> {
        let path = self.layout.category_tree_path();
        let _guard = self.locks.lock(&path).await;
        self.categories.save(store, &path).await
    }

    pub fn status(&self) -> SessionStatus {
        let mut status = SessionStatus {
            resources: self.resources.len(),
            pending_records: self.ledger.len(),
            categories_dirty: self.categories.is_dirty(),
            lists_dirty: self.lists.is_dirty(),
            stale_list_entries: self.stale_list_entries().len(),
            pulled_at: self.pulled_at,
            ..SessionStatus::default()
        };
        for record in self.ledger.records() {
            match record.action() {
                "add" => status.pending_adds += 1,
                "edit" => status.pending_edits += 1,
                "delete" => status.pending_deletes += 1,
                _ => status.pending_bulk += 1,
            }
        }
        status
    }
}
