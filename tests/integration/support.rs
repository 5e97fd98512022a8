//! Shared fixtures for integration tests

use async_trait::async_trait;
use catalog_sync::config::SyncOptions;
use catalog_sync::remote::{RemoteFile, WriteReceipt};
use catalog_sync::tree::{CategoryNode, CategoryTree};
use catalog_sync::{InMemoryStore, RemoteStore, StoreError, StoreLayout};
use parking_lot::Mutex;
use std::sync::Arc;

pub fn layout() -> StoreLayout {
    StoreLayout::default()
}

pub fn options(max_concurrent_writes: usize) -> SyncOptions {
    SyncOptions {
        max_concurrent_writes,
        ..SyncOptions::default()
    }
}

pub fn labels(path: &[&str]) -> Vec<String> {
    path.iter().map(|s| s.to_string()).collect()
}

/// Movies { Action, 动作, Drama }, Books { Sci-Fi }
pub fn sample_tree() -> CategoryTree {
    let movies = CategoryNode::new("film", "movies")
        .with_child("Action", CategoryNode::new("", "action"))
        .with_child("动作", CategoryNode::new("", "dongzuo"))
        .with_child("Drama", CategoryNode::new("", "drama"));
    let books = CategoryNode::new("book", "books").with_child("Sci-Fi", CategoryNode::new("", "scifi"));
    CategoryTree::new(
        [("Movies".to_string(), movies), ("Books".to_string(), books)]
            .into_iter()
            .collect(),
    )
}

/// Store seeded with the sample tree at the default tree path.
pub fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.seed_json(&layout().category_tree_path(), &sample_tree());
    store
}

/// Store that lets another writer commit to `path` between our sha read and
/// our write, once.
pub struct RacingStore {
    pub inner: Arc<InMemoryStore>,
    path: String,
    intruder: Mutex<Option<Vec<u8>>>,
}

impl RacingStore {
    pub fn new(inner: Arc<InMemoryStore>, path: &str, intruder: &[u8]) -> Self {
        Self {
            inner,
            path: path.to_string(),
            intruder: Mutex::new(Some(intruder.to_vec())),
        }
    }
}

#[async_trait]
impl RemoteStore for RacingStore {
    async fn read_file(&self, path: &str) -> Result<RemoteFile, StoreError> {
        let file = self.inner.read_file(path).await;
        if path == self.path {
            if let Some(content) = self.intruder.lock().take() {
                self.inner.seed(path, content);
            }
        }
        file
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        expected_sha: Option<&str>,
        message: &str,
    ) -> Result<WriteReceipt, StoreError> {
        self.inner.write_file(path, content, expected_sha, message).await
    }

    async fn delete_file(&self, path: &str, expected_sha: &str, message: &str) -> Result<(), StoreError> {
        self.inner.delete_file(path, expected_sha, message).await
    }
}
