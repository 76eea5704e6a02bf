//! Merge rules: defaults, override order, conflict handling.
//!
//! Record defaults, prompts and logging all carry `#[serde(default)]`, so a layer
//! only needs the keys it changes. Later layers win key by key.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
