//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, then the global file,
//! then `./catalog-sync.toml`, then `CATALOG_SYNC__SECTION__KEY` variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod state;

pub use crate::logging::LoggingConfig;
pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use state::StateConfig;

use crate::error::ApiError;
use crate::remote::StoreLayout;
use crate::sync::LedgerRetention;
use serde::{Deserialize, Serialize};

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub layout: StoreLayout,

    #[serde(default)]
    pub sync: SyncOptions,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Checks that hold regardless of command. Remote settings are only
    /// validated when a client is built.
    pub fn validate(&self) -> Result<(), ApiError> {
        self.sync.validate()?;
        if self.layout.record_root.trim_matches('/').is_empty()
            || self.layout.db_root.trim_matches('/').is_empty()
        {
            return Err(ApiError::ConfigError(
                "layout.record_root and layout.db_root cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[remote]`: the repository holding the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub repo: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Falls back to `GITHUB_TOKEN` when unset
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_user_agent() -> String {
    format!("catalog-sync/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            token: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.owner.trim().is_empty() || self.repo.trim().is_empty() {
            return Err(ApiError::ConfigError(
                "remote.owner and remote.repo must be set".to_string(),
            ));
        }
        if !(self.api_base.starts_with("https://") || self.api_base.starts_with("http://")) {
            return Err(ApiError::ConfigError(format!(
                "remote.api_base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }
        if self.branch.trim().is_empty() {
            return Err(ApiError::ConfigError("remote.branch cannot be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ApiError::ConfigError(
                "remote.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured token, else `GITHUB_TOKEN`. Empty values count as unset.
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(GITHUB_TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
    }

    /// `owner/repo`, used to scope local state and logs.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// `[sync]`: synchronization round behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Per-resource file operations in flight at once; 1 is sequential
    #[serde(default = "default_max_concurrent_writes")]
    pub max_concurrent_writes: usize,

    #[serde(default)]
    pub retention: LedgerRetention,
}

fn default_max_concurrent_writes() -> usize {
    1
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrent_writes: default_max_concurrent_writes(),
            retention: LedgerRetention::default(),
        }
    }
}

impl SyncOptions {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.max_concurrent_writes == 0 {
            return Err(ApiError::ConfigError(
                "sync.max_concurrent_writes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
