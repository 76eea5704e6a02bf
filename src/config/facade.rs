//! Config loader facade: assembles the source layers and deserializes the result.

use crate::config::merge::merge_policy;
use crate::config::sources::{self, global_file, workspace_file};
use crate::config::PipelineConfig;
use config::{ConfigError, File};
use std::path::Path;

/// Loads [`PipelineConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load every layer for `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<PipelineConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::add_environment(builder);
        builder.build()?.try_deserialize()
    }

    /// Load a single file on top of the built-in defaults; environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        sources::add_environment(builder).build()?.try_deserialize()
    }

    /// Built-in defaults only.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> PipelineConfig {
        PipelineConfig::default()
    }
}
