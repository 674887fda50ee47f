//! Configuration loading from files.
//!
//! The config file is layered under `ORGSITE_*` environment variables, so a
//! single value (say `ORGSITE_ROOT`) can be overridden for one build without
//! editing the file.

use std::path::{Path, PathBuf};

use super::{ConfigError, DEFAULT_CONFIG_FILE, SiteConfig};

/// Prefix of environment variables that override config file values.
const ENV_PREFIX: &str = "ORGSITE";

impl SiteConfig {
    /// Load the config from a file path. The format follows the file extension.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let site: SiteConfig = settings.try_deserialize()?;
        site.validated()
    }
}

/// Pick the config file for a build: an explicit path wins, otherwise
/// `site.yaml` inside the input directory.
pub fn discover_config_file(explicit: Option<&Path>, input_dir: &Path) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => input_dir.join(DEFAULT_CONFIG_FILE),
    }
}
