//! Loader that assembles a [`StoryloomConfig`] from every layered source.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::StoryloomConfig;
use config::{ConfigError, File};
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, workspace files, then environment.
    pub fn load(workspace_root: &Path) -> Result<StoryloomConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: StoryloomConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace = %workspace_root.display(),
            base_url = %config.gateway.base_url,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Defaults, then exactly `path`, then environment. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<StoryloomConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder);
        builder.build()?.try_deserialize()
    }
}
