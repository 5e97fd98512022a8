//! GitHub contents API client.
//!
//! `GET    /repos/{owner}/{repo}/contents/{path}?ref={branch}` -> `{sha, content, encoding}`
//! `PUT    /repos/{owner}/{repo}/contents/{path}` with `{message, content, sha?, branch}`
//! `DELETE /repos/{owner}/{repo}/contents/{path}` with `{message, sha, branch}`
//!
//! Files over the inline size limit come back with `encoding: "none"` and an
//! empty `content`; their bytes are fetched again with the raw media type.

use super::{RemoteFile, RemoteStore, WriteReceipt};
use crate::config::RemoteConfig;
use crate::error::{ApiError, StoreError};
use crate::types::Sha;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const ACCEPT: &str = "application/vnd.github.v3+json";
const RAW_ACCEPT: &str = "application/vnd.github.raw";
const BODY_EXCERPT_LEN: usize = 200;

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: CommitContent,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    branch: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

/// Remote store backed by a repository's contents API.
pub struct GithubContentsStore {
    client: Client,
    base_url: String,
    branch: String,
    token: String,
}

impl GithubContentsStore {
    /// Build a client from the `remote` configuration section.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let token = config.resolved_token().ok_or_else(|| {
            ApiError::ConfigError(
                "Remote token required (set remote.token or GITHUB_TOKEN)".to_string(),
            )
        })?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: format!(
                "{}/repos/{}/{}/contents",
                config.api_base.trim_end_matches('/'),
                config.owner,
                config.repo
            ),
            branch: config.branch.clone(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder, accept: &str) -> RequestBuilder {
        builder
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", accept)
    }

    async fn send(&self, path: &str, builder: RequestBuilder) -> Result<Response, StoreError> {
        self.send_accepting(path, builder, ACCEPT).await
    }

    async fn send_accepting(
        &self,
        path: &str,
        builder: RequestBuilder,
        accept: &str,
    ) -> Result<Response, StoreError> {
        self.authorized(builder, accept)
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("{}: {}", path, e)))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .query(&[("ref", self.branch.as_str())])
    }

    /// Raw bytes of a file too large to be inlined in a contents response.
    async fn read_raw(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        debug!(path, branch = %self.branch, "GET raw contents");
        let response = self.send_accepting(path, self.get(path), RAW_ACCEPT).await?;
        if !response.status().is_success() {
            return Err(failure(path, response, false).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(format!("{}: {}", path, e)))?;
        Ok(bytes.to_vec())
    }
}

/// Map a non-success status to the store error taxonomy.
pub(crate) fn classify_status(
    path: &str,
    status: StatusCode,
    body: &str,
    creating: bool,
) -> StoreError {
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound {
            path: path.to_string(),
        },
        StatusCode::CONFLICT => StoreError::stale_sha(path),
        // Creating without a sha over an existing file is rejected as unprocessable.
        StatusCode::UNPROCESSABLE_ENTITY if creating => StoreError::Conflict {
            path: path.to_string(),
            message: "file already exists, a sha is required to replace it".to_string(),
        },
        _ => {
            let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
            StoreError::Transport(format!("{} returned {}: {}", path, status, excerpt))
        }
    }
}

/// Decode the line-wrapped base64 payload of a contents response.
pub(crate) fn decode_content(path: &str, encoding: &str, content: &str) -> Result<Vec<u8>, StoreError> {
    if !encoding.is_empty() && encoding != "base64" {
        return Err(StoreError::Malformed {
            path: path.to_string(),
            reason: format!("unsupported content encoding '{}'", encoding),
        });
    }
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| StoreError::Malformed {
        path: path.to_string(),
        reason: format!("invalid base64 content: {}", e),
    })
}

/// Inline bytes of a contents response, `None` when the file was too large
/// to be inlined and must be downloaded raw.
fn inline_content(path: &str, body: &ContentsResponse) -> Result<Option<Vec<u8>>, StoreError> {
    if body.encoding == "none" {
        return Ok(None);
    }
    decode_content(path, &body.encoding, &body.content).map(Some)
}

async fn failure(path: &str, response: Response, creating: bool) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let err = classify_status(path, status, &body, creating);
    if !err.is_not_found() {
        warn!(path, status = status.as_u16(), "remote store request failed");
    }
    err
}

#[async_trait]
impl RemoteStore for GithubContentsStore {
    async fn read_file(&self, path: &str) -> Result<RemoteFile, StoreError> {
        debug!(path, branch = %self.branch, "GET contents");
        let response = self.send(path, self.get(path)).await?;
        if !response.status().is_success() {
            return Err(failure(path, response, false).await);
        }
        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("{}: invalid response: {}", path, e)))?;
        let content = match inline_content(path, &body)? {
            Some(content) => content,
            None => self.read_raw(path).await?,
        };
        Ok(RemoteFile {
            path: path.to_string(),
            sha: body.sha,
            content,
        })
    }

    async fn current_sha(&self, path: &str) -> Result<Option<Sha>, StoreError> {
        debug!(path, branch = %self.branch, "GET contents sha");
        let response = self.send(path, self.get(path)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(failure(path, response, false).await);
        }
        let body: ShaOnly = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("{}: invalid response: {}", path, e)))?;
        Ok(Some(body.sha))
    }

    async fn write_file(
        &self,
        path: &str,
        content: &[u8],
        expected_sha: Option<&str>,
        message: &str,
    ) -> Result<WriteReceipt, StoreError> {
        debug!(path, expected_sha = ?expected_sha, "PUT contents");
        let payload = PutRequest {
            message,
            content: STANDARD.encode(content),
            sha: expected_sha,
            branch: &self.branch,
        };
        let request = self.client.put(self.url(path)).json(&payload);
        let response = self.send(path, request).await?;
        if !response.status().is_success() {
            return Err(failure(path, response, expected_sha.is_none()).await);
        }
        let body: PutResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Transport(format!("{}: invalid response: {}", path, e)))?;
        Ok(WriteReceipt {
            path: path.to_string(),
            sha: body.content.sha,
        })
    }

    async fn delete_file(
        &self,
        path: &str,
        expected_sha: &str,
        message: &str,
    ) -> Result<(), StoreError> {
        debug!(path, expected_sha, "DELETE contents");
        let payload = DeleteRequest {
            message,
            sha: expected_sha,
            branch: &self.branch,
        };
        let request = self.client.delete(self.url(path)).json(&payload);
        let response = self.send(path, request).await?;
        if !response.status().is_success() {
            return Err(failure(path, response, false).await);
        }
        Ok(())
    }
}
