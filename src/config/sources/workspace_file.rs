//! Workspace config file: `<workspace>/catalog-sync.toml`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

pub const WORKSPACE_CONFIG_FILE: &str = "catalog-sync.toml";

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = workspace_root.join(WORKSPACE_CONFIG_FILE);
    if !path.exists() {
        return Ok(builder);
    }
    let path_str = path.to_str().ok_or_else(|| {
        ConfigError::Message(format!("Workspace config path is not valid UTF-8: {:?}", path))
    })?;
    Ok(builder.add_source(File::new(path_str, FileFormat::Toml)))
}
