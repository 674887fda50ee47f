//! The in-memory site tree.
//!
//! A `DirectoryNode` mirrors one folder of the org source directory: the
//! pages converted from its files plus one child node per subfolder. Page
//! file names and child names are checked for uniqueness independently.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::Page;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("folder '{folder}' already has a page named '{file_name}'")]
    DuplicatePage { folder: String, file_name: String },

    #[error("folder '{folder}' already has a subfolder named '{name}'")]
    DuplicateChild { folder: String, name: String },
}

/// A folder of the site: its pages and its named subfolders.
///
/// Serialized for templates as `{ name, pages, children }`, so an index page
/// can walk e.g. `site.pages.children.blog.pages`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryNode {
    name: String,
    pages: Vec<Page>,
    children: BTreeMap<String, DirectoryNode>,
}

impl DirectoryNode {
    /// Create an empty node. The root of the tree has an empty name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a page, keeping insertion order.
    pub fn add_page(&mut self, page: Page) -> Result<(), TreeError> {
        if self.page(&page.file_name).is_some() {
            return Err(TreeError::DuplicatePage {
                folder: self.name.clone(),
                file_name: page.file_name,
            });
        }
        self.pages.push(page);
        Ok(())
    }

    /// Attach an already built subtree under its own name.
    pub fn add_child(&mut self, child: DirectoryNode) -> Result<&mut DirectoryNode, TreeError> {
        if self.children.contains_key(&child.name) {
            return Err(TreeError::DuplicateChild {
                folder: self.name.clone(),
                name: child.name,
            });
        }
        Ok(self.children.entry(child.name.clone()).or_insert(child))
    }

    /// Create an empty subfolder and return it for filling.
    pub fn create_child(&mut self, name: &str) -> Result<&mut DirectoryNode, TreeError> {
        self.add_child(DirectoryNode::new(name))
    }

    /// Pages directly in this folder, in insertion order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Direct subfolders, ordered by name.
    pub fn children(&self) -> impl Iterator<Item = &DirectoryNode> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&DirectoryNode> {
        self.children.get(name)
    }

    /// Look up a descendant by a `/`-separated folder path. The empty path is
    /// this node.
    #[allow(dead_code)]
    pub fn find(&self, folder: &str) -> Option<&DirectoryNode> {
        folder
            .split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Look up a page in this folder by its output file name.
    pub fn page(&self, file_name: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.file_name == file_name)
    }

    /// Pages of this folder ordered by `compare`, e.g. `Page::by_date`.
    pub fn pages_sorted_by<F>(&self, mut compare: F) -> Vec<&Page>
    where
        F: FnMut(&Page, &Page) -> Ordering,
    {
        let mut pages: Vec<&Page> = self.pages.iter().collect();
        pages.sort_by(|a, b| compare(a, b));
        pages
    }

    /// Number of pages in this folder and all folders below it.
    pub fn page_count(&self) -> usize {
        self.pages.len() + self.children().map(DirectoryNode::page_count).sum::<usize>()
    }

    /// Number of folders below this one (not counting itself).
    pub fn folder_count(&self) -> usize {
        self.children().map(|c| 1 + c.folder_count()).sum()
    }
}
