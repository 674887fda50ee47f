use std::path::PathBuf;

use tracing::info;

use crate::config::SiteConfig;

use super::format::FormatRegistry;
use super::media::{MediaError, replace_media};
use super::render::{RenderError, Renderer, SiteContext};
use super::source::{FailurePolicy, SiteTreeBuilder, SourceError, SourceFailure};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub struct BuildReport {
    pub output_dir: PathBuf,
    pub pages: usize,
    pub folders: usize,
    pub media_files: usize,
    /// Documents skipped under `FailurePolicy::KeepGoing`.
    pub failures: Vec<SourceFailure>,
}

pub struct Builder {
    config: SiteConfig,
    /// Holds the org, templates and media folders
    input_dir: PathBuf,
    output_dir: PathBuf,
    policy: FailurePolicy,
    formats: FormatRegistry,
}

impl Builder {
    pub fn new(config: SiteConfig, input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            config,
            input_dir,
            output_dir,
            policy: FailurePolicy::default(),
            formats: FormatRegistry::with_defaults(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run a full build.
    ///
    /// 1. Convert the org folder into a site tree
    /// 2. Load the templates
    /// 3. Render every page into the mirrored output tree
    /// 4. Replace the output media folder with the source one
    ///
    /// Any error aborts the build; files already written stay in place.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        // Step 1: Build the site tree
        let org_dir = self.input_dir.join(&self.config.org);
        let tree = SiteTreeBuilder::new(&org_dir, &self.config, &self.formats)
            .with_policy(self.policy)
            .build()?;
        info!(
            pages = tree.root.page_count(),
            folders = tree.root.folder_count(),
            "built site tree"
        );

        // Step 2: Load templates
        let templates_dir = self.input_dir.join(&self.config.templates);
        let renderer = Renderer::new(&templates_dir, &self.config)?;

        // Step 3: Render into the output directory
        std::fs::create_dir_all(&self.output_dir).map_err(|source| BuildError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;
        let site = SiteContext::new(&self.config, &tree.root);
        let pages = renderer.write_tree(&tree.root, &self.output_dir, "", &site)?;
        info!(pages, output = %self.output_dir.display(), "wrote pages");

        // Step 4: Media
        let media_files = replace_media(
            &self.input_dir.join(&self.config.media),
            &self.output_dir.join(&self.config.media),
        )?;

        Ok(BuildReport {
            output_dir: self.output_dir.clone(),
            pages,
            folders: tree.root.folder_count(),
            media_files,
            failures: tree.failures,
        })
    }
}
