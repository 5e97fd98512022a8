//! XDG Base Directory utilities for local state and config discovery.

use crate::error::ApiError;
use std::path::PathBuf;

pub const APP_DIR: &str = "catalog-sync";

/// `$XDG_DATA_HOME`, else `$HOME/.local/share`.
pub fn data_home() -> Option<PathBuf> {
    if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data_home.is_empty() {
            return Some(PathBuf::from(xdg_data_home));
        }
    }

    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// `$XDG_CONFIG_HOME`, else `$HOME/.config`.
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        ApiError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// Local state directory for one remote repository.
///
/// Returns `$XDG_DATA_HOME/catalog-sync/<owner>/<repo>/`. Path separators and
/// dot segments in either name are rejected so the result stays inside the
/// data home.
pub fn remote_data_dir(owner: &str, repo: &str) -> Result<PathBuf, ApiError> {
    let data_home = data_home().ok_or_else(|| {
        ApiError::ConfigError(
            "Could not determine XDG data home directory (HOME not set)".to_string(),
        )
    })?;
    for segment in [owner, repo] {
        if segment.is_empty()
            || segment == "."
            || segment == ".."
            || segment.contains(['/', '\\'])
        {
            return Err(ApiError::ConfigError(format!(
                "Invalid repository segment for state directory: '{}'",
                segment
            )));
        }
    }
    Ok(data_home.join(APP_DIR).join(owner).join(repo))
}
