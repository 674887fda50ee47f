//! Configuration loading and types for orgsite.
//!
//! - Type definitions for the site configuration (`types`)
//! - Loading and validating configs from files (`load`)

use chrono::format::{Item, StrftimeItems};

mod load;
mod types;

pub use load::discover_config_file;
pub use types::SiteConfig;

/// File name looked up inside the input directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "site.yaml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not find configuration file at {0}")]
    NotFound(std::path::PathBuf),

    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid config: {0}")]
    Validation(String),
}

// =============================================================================
// Validation
// =============================================================================

impl SiteConfig {
    /// Normalize values that have a canonical form and reject unusable ones.
    ///
    /// The root prefix loses its trailing slashes so URLs can be built as
    /// `root + "/" + path` (a root of `/` becomes empty).
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.root = self.root.trim_end_matches('/').to_string();

        if self.default_template.trim().is_empty() {
            return Err(ConfigError::Validation(
                "'default_template' must not be empty".to_string(),
            ));
        }

        if StrftimeItems::new(&self.dateformat).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Validation(format!(
                "'dateformat' is not a valid strftime format: '{}'",
                self.dateformat
            )));
        }

        for (key, path) in [
            ("org", &self.org),
            ("media", &self.media),
            ("templates", &self.templates),
        ] {
            if path.as_os_str().is_empty() || path.is_absolute() {
                return Err(ConfigError::Validation(format!(
                    "'{key}' must be a path relative to the input directory, got '{}'",
                    path.display()
                )));
            }
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_root_trailing_slash_is_stripped() {
        let config = SiteConfig {
            root: "/blog/".to_string(),
            ..SiteConfig::default()
        };
        assert_eq!(config.validated().unwrap().root, "/blog");
    }

    #[test]
    fn test_default_root_becomes_empty() {
        assert_eq!(SiteConfig::default().validated().unwrap().root, "");
    }

    #[test]
    fn test_empty_default_template_rejected() {
        let config = SiteConfig {
            default_template: "  ".to_string(),
            ..SiteConfig::default()
        };
        assert!(matches!(config.validated(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_absolute_subpath_rejected() {
        let config = SiteConfig {
            media: PathBuf::from("/var/media"),
            ..SiteConfig::default()
        };
        let err = config.validated().unwrap_err();
        assert!(err.to_string().contains("'media'"));
    }

    #[test]
    fn test_invalid_dateformat_rejected() {
        let config = SiteConfig {
            dateformat: "%Y-%Q".to_string(),
            ..SiteConfig::default()
        };
        let err = config.validated().unwrap_err();
        assert!(err.to_string().contains("'dateformat'"));
    }
}
