//! Remote document paths.

use serde::{Deserialize, Serialize};

pub const CATEGORY_TREE_FILE: &str = "db.json";
pub const LIST_FILE: &str = "list.json";
pub const RESOURCE_INDEX_FILE: &str = "uuid_resource_curd.json";
pub const TAGS_FILE: &str = "tabs.json";

/// Where each document lives, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLayout {
    /// Directory holding one `<uuid>.json` per resource
    #[serde(default = "default_record_root")]
    pub record_root: String,
    /// Directory holding the tree, list, index and tag documents
    #[serde(default = "default_db_root")]
    pub db_root: String,
}

fn default_record_root() -> String {
    "src/db/zyt".to_string()
}

fn default_db_root() -> String {
    "src/db".to_string()
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            record_root: default_record_root(),
            db_root: default_db_root(),
        }
    }
}

fn join(root: &str, file: &str) -> String {
    let root = root.trim_matches('/');
    if root.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", root, file)
    }
}

impl StoreLayout {
    pub fn resource_path(&self, uuid: &str) -> String {
        join(&self.record_root, &format!("{}.json", uuid))
    }

    pub fn category_tree_path(&self) -> String {
        join(&self.db_root, CATEGORY_TREE_FILE)
    }

    pub fn list_path(&self) -> String {
        join(&self.db_root, LIST_FILE)
    }

    pub fn resource_index_path(&self) -> String {
        join(&self.db_root, RESOURCE_INDEX_FILE)
    }

    pub fn tags_path(&self) -> String {
        join(&self.db_root, TAGS_FILE)
    }
}
