//! Global config file: `$XDG_CONFIG_HOME/catalog-sync/config.toml`

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::PathBuf;

pub fn global_config_path() -> Option<PathBuf> {
    xdg::config_home()
        .ok()
        .map(|home| home.join(xdg::APP_DIR).join("config.toml"))
}

/// Add the global file if it exists; a missing file is not an error.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path) = global_config_path().filter(|p| p.exists()) else {
        return Ok(builder);
    };
    let Some(path_str) = path.to_str() else {
        return Err(ConfigError::Message(format!(
            "Global config path is not valid UTF-8: {:?}",
            path
        )));
    };
    Ok(builder.add_source(File::new(path_str, FileFormat::Toml).required(false)))
}
