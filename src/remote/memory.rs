//! In-process document store with the same sha precondition rules as the
//! hosted store. Used for tests and offline dry runs.

use super::{RemoteFile, RemoteStore, WriteReceipt};
use crate::error::StoreError;
use crate::types::Sha;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredFile {
    sha: Sha,
    content: Vec<u8>,
}

/// Remote store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    files: RwLock<BTreeMap<String, StoredFile>>,
    writes: RwLock<HashMap<String, usize>>,
    deletes: RwLock<HashMap<String, usize>>,
    failures: RwLock<HashMap<String, StoreError>>,
}

/// Content hash used as the revision token.
pub fn content_sha(content: &[u8]) -> Sha {
    hex::encode(blake3::hash(content).as_bytes())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without counting it as a write.
    pub fn seed(&self, path: &str, content: impl Into<Vec<u8>>) -> Sha {
        let content = content.into();
        let sha = content_sha(&content);
        self.files.write().insert(
            path.to_string(),
            StoredFile {
                sha: sha.clone(),
                content,
            },
        );
        sha
    }

    /// Seed a JSON document (pretty printed, as committed by the synchronizer).
    pub fn seed_json<T: serde::Serialize>(&self, path: &str, value: &T) -> Sha {
        let content = serde_json::to_vec_pretty(value).unwrap_or_default();
        self.seed(path, content)
    }

    /// Make every write or delete of `path` fail with `error` until cleared.
    pub fn fail_mutations(&self, path: &str, error: StoreError) {
        self.failures.write().insert(path.to_string(), error);
    }

    pub fn clear_failures(&self) {
        self.failures.write().clear();
    }

    fn injected_failure(&self, path: &str) -> Result<(), StoreError> {
        match self.failures.read().get(path) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().get(path).map(|f| f.content.clone())
    }

    pub fn json(&self, path: &str) -> Option<serde_json::Value> {
        self.content(path)
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    pub fn sha(&self, path: &str) -> Option<Sha> {
        self.files.read().get(path).map(|f| f.sha.clone())
    }

    /// Paths currently stored, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    /// Number of successful writes to `path`.
    pub fn write_count(&self, path: &str) -> usize {
        self.writes.read().get(path).copied().unwrap_or(0)
    }

    /// Number of successful deletes of `path`.
    pub fn delete_count(&self, path: &str) -> usize {
        self.deletes.read().get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn read_file(&self, path: &str) -> Result<RemoteFile, StoreError> {
        let files = self.files.read();
        let file = files.get(path).ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        Ok(RemoteFile {
            path: path.to_string(),
            sha: file.sha.clone(),
            content: file.content.clone(),
        })
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        expected_sha: Option<&str>,
        message: &str,
    ) -> Result<WriteReceipt, StoreError> {
        self.injected_failure(path)?;
        let mut files = self.files.write();
        match (files.get(path), expected_sha) {
            (Some(current), Some(expected)) if current.sha == expected => {}
            (None, None) => {}
            (Some(_), None) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: "file already exists, a sha is required to replace it".to_string(),
                })
            }
            (Some(_), Some(_)) => return Err(StoreError::stale_sha(path)),
            (None, Some(_)) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: "file no longer exists".to_string(),
                })
            }
        }

        let sha = content_sha(content);
        files.insert(
            path.to_string(),
            StoredFile {
                sha: sha.clone(),
                content: content.to_vec(),
            },
        );
        drop(files);
        *self.writes.write().entry(path.to_string()).or_insert(0) += 1;
        debug!(path, message, sha = %sha, "memory store write");
        Ok(WriteReceipt {
            path: path.to_string(),
            sha,
        })
    }

    async fn delete_file(
        &self,
        path: &str,
        expected_sha: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        self.injected_failure(path)?;
        let mut files = self.files.write();
        match files.get(path) {
            None => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                })
            }
            Some(current) if current.sha != expected_sha => {
                return Err(StoreError::stale_sha(path))
            }
            Some(_) => {}
        }
        files.remove(path);
        drop(files);
        *self.deletes.write().entry(path.to_string()).or_insert(0) += 1;
        debug!(path, message, "memory store delete");
        Ok(())
    }
}
