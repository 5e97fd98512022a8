//! Built-in defaults, the lowest-precedence layer.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the defaults every later source may override.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("remote.api_base", "https://api.github.com")?
        .set_default("remote.branch", "main")?
        .set_default("remote.timeout_ms", 5000_i64)?
        .set_default("layout.record_root", "src/db/zyt")?
        .set_default("layout.db_root", "src/db")?
        .set_default("sync.max_concurrent_writes", 1_i64)?
        .set_default("sync.retention", "discard-all")
}
