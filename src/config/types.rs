//! Configuration type definitions.
//!
//! These types are pure data - no I/O. Every field has a default so a
//! config file only needs to name what it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Site configuration
// =============================================================================

/// Site-wide settings, read once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// URL prefix every page URL starts with. Stored without a trailing slash.
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_name")]
    pub name: String,
    /// Template used when no folder or page specific template exists.
    #[serde(default = "default_template")]
    pub default_template: String,
    /// Subdirectory of the input holding the org documents.
    #[serde(default = "default_org")]
    pub org: PathBuf,
    /// Subdirectory of the input (and output) holding static media.
    #[serde(default = "default_media")]
    pub media: PathBuf,
    /// Subdirectory of the input holding the templates.
    #[serde(default = "default_templates")]
    pub templates: PathBuf,
    /// strftime-style format used by the `datetime` template filter.
    #[serde(default = "default_dateformat")]
    pub dateformat: String,
    /// Author alias
    #[serde(default = "default_alias")]
    pub alias: String,
    /// Author display name
    #[serde(default = "default_fullname")]
    pub fullname: String,
    /// Added to every heading level of a converted document.
    #[serde(default = "default_hl_offset")]
    pub hl_offset: u8,
    /// Strip empty `<p></p>` paragraphs from converted documents.
    #[serde(default = "default_remove_empty_p")]
    pub remove_empty_p: bool,
}

fn default_root() -> String {
    "/".to_string()
}

fn default_name() -> String {
    "Default OrgSite".to_string()
}

fn default_template() -> String {
    "default.html".to_string()
}

fn default_org() -> PathBuf {
    PathBuf::from("org")
}

fn default_media() -> PathBuf {
    PathBuf::from("media")
}

fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}

fn default_dateformat() -> String {
    "%d %b %Y at %H:%M".to_string()
}

fn default_alias() -> String {
    "anon".to_string()
}

fn default_fullname() -> String {
    "Anonymous".to_string()
}

fn default_hl_offset() -> u8 {
    1
}

fn default_remove_empty_p() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            name: default_name(),
            default_template: default_template(),
            org: default_org(),
            media: default_media(),
            templates: default_templates(),
            dateformat: default_dateformat(),
            alias: default_alias(),
            fullname: default_fullname(),
            hl_offset: default_hl_offset(),
            remove_empty_p: default_remove_empty_p(),
        }
    }
}
