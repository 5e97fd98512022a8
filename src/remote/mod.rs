//! Remote Store Client
//!
//! Capability wrapper over a hosted, content-addressed document store. Every
//! file has a path, a content blob and a revision hash ("sha"). Writes are
//! conditioned on the sha the caller last observed; a stale sha is a
//! `StoreError::Conflict` and never mutates the remote content.

pub mod github;
pub mod layout;
pub mod memory;

pub use github::GithubContentsStore;
pub use layout::StoreLayout;
pub use memory::InMemoryStore;

use crate::error::StoreError;
use crate::types::Sha;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Current content and revision of a remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: Sha,
    pub content: Vec<u8>,
}

impl RemoteFile {
    /// Decode the content as a JSON document.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_slice(&self.content).map_err(|e| StoreError::Malformed {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Result of a successful conditioned write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub path: String,
    pub sha: Sha,
}

/// Remote document store contract.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch current content and sha. Absence is `StoreError::NotFound`.
    async fn read_file(&self, path: &str) -> Result<RemoteFile, StoreError>;

    /// Create (`expected_sha == None`, file absent) or replace (current sha equals
    /// `expected_sha`) a file.
    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        expected_sha: Option<&str>,
        message: &str,
    ) -> Result<WriteReceipt, StoreError>;

    /// Delete a file whose current sha equals `expected_sha`.
    async fn delete_file(
        &self,
        path: &str,
        expected_sha: &str,
        message: &str,
    ) -> Result<(), StoreError>;

    /// Current sha of a file, `None` when absent.
    async fn current_sha(&self, path: &str) -> Result<Option<Sha>, StoreError> {
        match self.read_file(path).await {
            Ok(file) => Ok(Some(file.sha)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Serialize a document the way it is committed: pretty JSON, two-space indent.
pub fn encode_document<T: Serialize + ?Sized>(path: &str, value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(value).map_err(|e| {
        StoreError::Validation(format!("Failed to serialize {}: {}", path, e))
    })
}

/// Plain JSON fetch used for initial loads: decodes the document at `path`
/// together with its sha, treating absence as `None`.
pub async fn fetch_json<T>(store: &dyn RemoteStore, path: &str) -> Result<Option<(T, Sha)>, StoreError>
where
    T: DeserializeOwned,
{
    match store.read_file(path).await {
        Ok(file) => {
            let value = file.parse_json()?;
            Ok(Some((value, file.sha)))
        }
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write `content` after re-reading the file's current sha.
///
/// The sha is fetched immediately before the write, so the only conflict window
/// is between the two requests.
pub async fn write_with_fresh_sha(
    store: &dyn RemoteStore,
    path: &str,
    content: &[u8],
    message: &str,
) -> Result<WriteReceipt, StoreError> {
    let sha = store.current_sha(path).await?;
    store.write_file(path, content, sha.as_deref(), message).await
}
