//! StateConfig and resolution of the local state directory.

use super::{xdg, RemoteConfig};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[state]`: where the session database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Explicit directory; `None` means `$XDG_DATA_HOME/catalog-sync/<owner>/<repo>/`
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl StateConfig {
    pub fn resolve_dir(&self, remote: &RemoteConfig) -> Result<PathBuf, ApiError> {
        match &self.dir {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.clone()),
            _ => xdg::remote_data_dir(&remote.owner, &remote.repo),
        }
    }
}
