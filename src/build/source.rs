use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SiteConfig;

use super::document::Page;
use super::format::{FormatContext, FormatError, FormatRegistry};
use super::paths::{html_file_name, join_folder, page_url};
use super::tree::{DirectoryNode, TreeError};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("source path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read directory entry in {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file name is not valid UTF-8: {0}")]
    InvalidFileName(PathBuf),

    #[error("no document format can convert {0}")]
    NoFormat(PathBuf),

    #[error("failed to convert {path}: {source}")]
    Convert {
        path: PathBuf,
        source: FormatError,
    },

    #[error("document has no title: {0}")]
    MissingTitle(PathBuf),

    #[error("{path}: {source}")]
    Tree { path: PathBuf, source: TreeError },
}

// =============================================================================
// Failure policy
// =============================================================================

/// What to do when a single document cannot be turned into a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole build on the first failing document.
    #[default]
    FailFast,
    /// Skip failing documents, remember why, and keep building.
    KeepGoing,
}

/// A document skipped under `FailurePolicy::KeepGoing`.
#[derive(Debug)]
pub struct SourceFailure {
    pub path: PathBuf,
    pub error: SourceError,
}

/// The result of walking the org directory.
#[derive(Debug)]
pub struct SiteTree {
    pub root: DirectoryNode,
    /// Documents that were skipped. Always empty under `FailFast`.
    pub failures: Vec<SourceFailure>,
}

// =============================================================================
// Tree builder
// =============================================================================

/// Walks the org directory and converts every file into a page.
///
/// Only reads; nothing is written while the tree is built.
pub struct SiteTreeBuilder<'a> {
    org_dir: &'a Path,
    config: &'a SiteConfig,
    formats: &'a FormatRegistry,
    policy: FailurePolicy,
    failures: Vec<SourceFailure>,
}

impl<'a> SiteTreeBuilder<'a> {
    pub fn new(org_dir: &'a Path, config: &'a SiteConfig, formats: &'a FormatRegistry) -> Self {
        Self {
            org_dir,
            config,
            formats,
            policy: FailurePolicy::default(),
            failures: Vec::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the whole tree, starting at the org directory itself.
    pub fn build(mut self) -> Result<SiteTree, SourceError> {
        if !self.org_dir.exists() {
            return Err(SourceError::PathNotFound(self.org_dir.to_path_buf()));
        }
        if !self.org_dir.is_dir() {
            return Err(SourceError::NotADirectory(self.org_dir.to_path_buf()));
        }

        let mut root = DirectoryNode::new("");
        self.fill_folder(&mut root, "")?;
        Ok(SiteTree {
            root,
            failures: self.failures,
        })
    }

    /// Fill `node` with the pages and subfolders of `folder` (relative to the
    /// org directory).
    fn fill_folder(&mut self, node: &mut DirectoryNode, folder: &str) -> Result<(), SourceError> {
        let dir = if folder.is_empty() {
            self.org_dir.to_path_buf()
        } else {
            self.org_dir.join(folder)
        };
        let (subdirs, files) = list_folder(&dir)?;

        for file_name in files {
            let path = dir.join(&file_name);
            let added = self
                .load_page(&path, &file_name, folder)
                .and_then(|page| {
                    node.add_page(page).map_err(|source| SourceError::Tree {
                        path: path.clone(),
                        source,
                    })
                });
            if let Err(error) = added {
                self.handle_failure(path, error)?;
            }
        }
        debug!(folder, pages = node.pages().len(), "built folder");

        for subdir in subdirs {
            let child = node.create_child(&subdir).map_err(|source| SourceError::Tree {
                path: dir.join(&subdir),
                source,
            })?;
            self.fill_folder(child, &join_folder(folder, &subdir))?;
        }

        Ok(())
    }

    /// Read and convert one source file.
    fn load_page(&self, path: &Path, file_name: &str, folder: &str) -> Result<Page, SourceError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SourceError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let ctx = FormatContext::from_config(self.config);
        let converted = self
            .formats
            .convert(path, &raw, &ctx)
            .ok_or_else(|| SourceError::NoFormat(path.to_path_buf()))?
            .map_err(|source| SourceError::Convert {
                path: path.to_path_buf(),
                source,
            })?;

        let title = converted
            .title
            .ok_or_else(|| SourceError::MissingTitle(path.to_path_buf()))?;

        let url = page_url(&self.config.root, folder, &html_file_name(file_name));

        Ok(Page::new(
            title,
            file_name.to_string(),
            converted.date.as_deref(),
            converted.html,
            url,
        ))
    }

    fn handle_failure(&mut self, path: PathBuf, error: SourceError) -> Result<(), SourceError> {
        match self.policy {
            FailurePolicy::FailFast => Err(error),
            FailurePolicy::KeepGoing => {
                warn!(path = %path.display(), %error, "skipping document");
                self.failures.push(SourceFailure { path, error });
                Ok(())
            }
        }
    }
}

/// List a folder, split into subdirectory names and file names.
///
/// Both lists are sorted by name so repeated builds see the same order.
/// Directory detection follows symlinks.
fn list_folder(dir: &Path) -> Result<(Vec<String>, Vec<String>), SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SourceError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut subdirs = Vec::new();
    let mut files = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|source| SourceError::ReadEntry {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| SourceError::InvalidFileName(path.clone()))?;

        if path.is_dir() {
            subdirs.push(name);
        } else {
            files.push(name);
        }
    }

    subdirs.sort();
    files.sort();
    Ok((subdirs, files))
}
