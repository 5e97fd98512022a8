//! List Bucket Curator
//!
//! Maintains the curated list document: four ordered buckets of denormalized
//! resource summaries, unique by uuid within a bucket. Other members of the
//! document (for example `carousel`) are carried through untouched.

use crate::error::StoreError;
use crate::resource::{ResourceMap, ResourceSummary};
use crate::types::ResourceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Named list bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    #[serde(alias = "recommended")]
    Recommend,
    Hot,
    Latest,
    Top,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Recommend, Bucket::Hot, Bucket::Latest, Bucket::Top];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Recommend => "recommend",
            Bucket::Hot => "hot",
            Bucket::Latest => "latest",
            Bucket::Top => "top",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommend" | "recommended" => Ok(Bucket::Recommend),
            "hot" => Ok(Bucket::Hot),
            "latest" => Ok(Bucket::Latest),
            "top" => Ok(Bucket::Top),
            other => Err(StoreError::Validation(format!(
                "Unknown list bucket '{}' (expected recommend, hot, latest or top)",
                other
            ))),
        }
    }
}

/// The whole list document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListDocument {
    #[serde(default)]
    pub recommend: Vec<ResourceSummary>,
    #[serde(default)]
    pub hot: Vec<ResourceSummary>,
    #[serde(default)]
    pub latest: Vec<ResourceSummary>,
    #[serde(default)]
    pub top: Vec<ResourceSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListDocument {
    pub fn bucket(&self, bucket: Bucket) -> &[ResourceSummary] {
        match bucket {
            Bucket::Recommend => &self.recommend,
            Bucket::Hot => &self.hot,
            Bucket::Latest => &self.latest,
            Bucket::Top => &self.top,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<ResourceSummary> {
        match bucket {
            Bucket::Recommend => &mut self.recommend,
            Bucket::Hot => &mut self.hot,
            Bucket::Latest => &mut self.latest,
            Bucket::Top => &mut self.top,
        }
    }
}

/// Result of assigning one resource to a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOutcome {
    Inserted,
    AlreadyPresent,
    UnknownResource,
}

/// Bucket entry whose resource no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleEntry {
    pub bucket: Bucket,
    pub uuid: ResourceId,
}

/// Curator over an in-memory list document.
#[derive(Debug, Clone, Default)]
pub struct ListBucketCurator {
    document: ListDocument,
    dirty: bool,
}

impl ListBucketCurator {
    pub fn new(document: ListDocument) -> Self {
        Self {
            document,
            dirty: false,
        }
    }

    pub(crate) fn restore(document: ListDocument, dirty: bool) -> Self {
        Self { document, dirty }
    }

    pub fn document(&self) -> &ListDocument {
        &self.document
    }

    pub fn bucket(&self, bucket: Bucket) -> &[ResourceSummary] {
        self.document.bucket(bucket)
    }

    pub fn contains(&self, bucket: Bucket, uuid: &str) -> bool {
        self.document.bucket(bucket).iter().any(|s| s.uuid == uuid)
    }

    /// Whether the document changed since it was loaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Append a snapshot unless `uuid` is already in the bucket.
    pub fn assign(&mut self, bucket: Bucket, summary: ResourceSummary) -> AssignOutcome {
        if self.contains(bucket, &summary.uuid) {
            return AssignOutcome::AlreadyPresent;
        }
        self.document.bucket_mut(bucket).push(summary);
        self.dirty = true;
        AssignOutcome::Inserted
    }

    /// Assign several resources, snapshotting each from `resources`.
    pub fn assign_many(
        &mut self,
        bucket: Bucket,
        uuids: &[ResourceId],
        resources: &ResourceMap,
    ) -> Vec<(ResourceId, AssignOutcome)> {
        uuids
            .iter()
            .map(|uuid| {
                let outcome = match resources.get(uuid) {
                    Some(resource) => {
                        self.assign(bucket, ResourceSummary::snapshot(uuid, resource))
                    }
                    None => AssignOutcome::UnknownResource,
                };
                (uuid.clone(), outcome)
            })
            .collect()
    }

    /// Entries referring to resources absent from `resources`.
    pub fn stale_entries(&self, resources: &ResourceMap) -> Vec<StaleEntry> {
        Bucket::ALL
            .iter()
            .flat_map(|&bucket| {
                self.document
                    .bucket(bucket)
                    .iter()
                    .filter(|s| !resources.contains_key(&s.uuid))
                    .map(move |s| StaleEntry {
                        bucket,
                        uuid: s.uuid.clone(),
                    })
            })
            .collect()
    }

    /// Remove stale entries. Never called implicitly by synchronization.
    pub fn prune_stale(&mut self, resources: &ResourceMap) -> Vec<StaleEntry> {
        let stale = self.stale_entries(resources);
        if !stale.is_empty() {
            for bucket in Bucket::ALL {
                self.document
                    .bucket_mut(bucket)
                    .retain(|s| resources.contains_key(&s.uuid));
            }
            self.dirty = true;
        }
        stale
    }

    /// The four-bucket document for a whole-file write.
    pub fn serialize(&self) -> &ListDocument {
        &self.document
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
