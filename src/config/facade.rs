//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::SyncConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the global file, `<workspace_root>/catalog-sync.toml` and
    /// the environment.
    pub fn load(workspace_root: &Path) -> Result<SyncConfig, ConfigError> {
        MergeService::load(workspace_root)
    }

    /// Load a specific file with the environment overlay; file discovery is
    /// skipped.
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    pub fn default() -> SyncConfig {
        SyncConfig::default()
    }
}
