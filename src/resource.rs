//! Resource records
//!
//! A resource is one catalog entry. The aggregate index document maps each
//! uuid to its record; list buckets hold denormalized `ResourceSummary` copies.

use crate::error::StoreError;
use crate::types::{EpochMillis, ResourceId};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Insertion-ordered `uuid -> Resource` map (content of the aggregate index)
pub type ResourceMap = IndexMap<ResourceId, Resource>;

/// Download location on one platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    #[serde(rename = "link", default)]
    pub url: String,
    #[serde(rename = "psw", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub size: String,
}

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Tag name to value. List buckets may carry a plain array of names,
    /// which reads as `name -> true`.
    #[serde(default, deserialize_with = "tags_from_map_or_list")]
    pub tags: IndexMap<String, Value>,
    #[serde(default)]
    pub source_links: IndexMap<String, SourceLink>,
    #[serde(default)]
    pub uploaded: EpochMillis,
    #[serde(default)]
    pub update_time: EpochMillis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_information: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_information: Option<Map<String, Value>>,
    /// Fields this crate does not model, preserved on round trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Category labels from the root, split on the category separator.
    pub fn category_path(&self) -> Vec<String> {
        crate::types::parse_category_path(&self.category)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsRepr {
    Map(IndexMap<String, Value>),
    List(Vec<Value>),
}

fn tags_from_map_or_list<'de, D>(deserializer: D) -> Result<IndexMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TagsRepr>::deserialize(deserializer)? {
        None => IndexMap::new(),
        Some(TagsRepr::Map(map)) => map,
        Some(TagsRepr::List(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => (name, Value::Bool(true)),
                other => (other.to_string(), Value::Bool(true)),
            })
            .collect(),
    })
}

/// Denormalized resource snapshot stored in a list bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub uuid: ResourceId,
    #[serde(flatten)]
    pub resource: Resource,
}

impl ResourceSummary {
    pub fn snapshot(uuid: &str, resource: &Resource) -> Self {
        Self {
            uuid: uuid.to_string(),
            resource: resource.clone(),
        }
    }
}

/// Mint a fresh resource identifier.
pub fn mint_resource_id() -> ResourceId {
    uuid::Uuid::new_v4().to_string()
}

/// Reject identifiers that cannot name a remote file.
pub fn validate_resource_id(uuid: &str) -> Result<(), StoreError> {
    if uuid.trim().is_empty() {
        return Err(StoreError::Validation(
            "Resource uuid cannot be empty".to_string(),
        ));
    }
    if uuid.contains('/') || uuid.contains('\\') || uuid == "." || uuid == ".." {
        return Err(StoreError::Validation(format!(
            "Resource uuid '{}' is not a valid file name",
            uuid
        )));
    }
    Ok(())
}

/// Validate a resource payload for add/edit.
pub fn validate_resource(uuid: &str, resource: &Resource) -> Result<(), StoreError> {
    validate_resource_id(uuid)?;
    if resource.name.trim().is_empty() {
        return Err(StoreError::Validation(format!(
            "Resource {} must have a name",
            uuid
        )));
    }
    Ok(())
}
