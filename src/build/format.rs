//! Pluggable document format system.
//!
//! A format turns the raw text of a source file into a title, a raw date
//! string and an HTML body. Org is the default format and also handles files
//! whose extension no format claims; Markdown is registered alongside it.
//!
//! # Adding a New Format
//!
//! ```ignore
//! struct AsciidocFormat;
//!
//! impl ContentFormat for AsciidocFormat {
//!     fn name(&self) -> &'static str { "asciidoc" }
//!     fn extensions(&self) -> &[&'static str] { &["adoc", "asciidoc"] }
//!     fn convert(&self, raw: &str, ctx: &FormatContext) -> Result<ConvertedDocument, FormatError> {
//!         // Convert AsciiDoc to HTML...
//!     }
//! }
//!
//! registry.register(AsciidocFormat);
//! ```

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::build::markdown::MarkdownFormat;
use crate::build::org::OrgFormat;
use crate::config::SiteConfig;

static EMPTY_PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>\s*</p>\n?").expect("empty paragraph pattern is valid"));

/// A converted document, before it becomes a `Page`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertedDocument {
    /// Title, if the document declares one.
    pub title: Option<String>,
    /// Raw date string (an org timestamp), if the document declares one.
    pub date: Option<String>,
    /// The rendered HTML body.
    pub html: String,
}

/// Options applied while converting.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext {
    /// Added to every heading level (clamped to `h6`).
    pub hl_offset: u8,
    /// Strip empty `<p></p>` paragraphs from the output.
    pub remove_empty_p: bool,
}

impl FormatContext {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            hl_offset: config.hl_offset,
            remove_empty_p: config.remove_empty_p,
        }
    }

    /// Shift a heading level by the offset, never past `h6`.
    pub fn heading_level(&self, level: usize) -> usize {
        (level + usize::from(self.hl_offset)).clamp(1, 6)
    }
}

/// Error during document conversion.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

/// A document format that can convert source files to HTML.
pub trait ContentFormat: Send + Sync {
    /// The name of this format (e.g., "org", "markdown").
    fn name(&self) -> &'static str;

    /// File extensions this format handles (lowercase, without dot).
    fn extensions(&self) -> &[&'static str];

    /// Convert raw source text.
    fn convert(&self, raw: &str, ctx: &FormatContext) -> Result<ConvertedDocument, FormatError>;
}

/// Registry of document formats.
///
/// The first registered format is the fallback for unclaimed extensions.
pub struct FormatRegistry {
    formats: Vec<Box<dyn ContentFormat>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// Create a registry with the default formats (Org, then Markdown).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(OrgFormat);
        registry.register(MarkdownFormat);
        registry
    }

    /// Register a new format.
    ///
    /// Later registrations take precedence for overlapping extensions.
    pub fn register<F: ContentFormat + 'static>(&mut self, format: F) {
        self.formats.push(Box::new(format));
    }

    /// Find the format claiming a file extension.
    pub fn for_extension(&self, ext: &str) -> Option<&dyn ContentFormat> {
        let ext_lower = ext.to_lowercase();
        // Search in reverse so later registrations take precedence
        self.formats
            .iter()
            .rev()
            .find(|f| f.extensions().iter().any(|e| *e == ext_lower))
            .map(|f| f.as_ref())
    }

    /// Find the format for a file path, falling back to the first
    /// registered format when the extension is unclaimed or missing.
    pub fn for_path(&self, path: &Path) -> Option<&dyn ContentFormat> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.for_extension(ext))
            .or_else(|| self.formats.first().map(|f| f.as_ref()))
    }

    /// Convert a source file's content with the format chosen for `path`.
    ///
    /// Returns `None` if the registry is empty.
    pub fn convert(
        &self,
        path: &Path,
        raw: &str,
        ctx: &FormatContext,
    ) -> Option<Result<ConvertedDocument, FormatError>> {
        let format = self.for_path(path)?;
        debug!(path = %path.display(), format = format.name(), "converting document");
        Some(format.convert(raw, ctx).map(|mut doc| {
            if ctx.remove_empty_p {
                doc.html = remove_empty_paragraphs(&doc.html);
            }
            doc
        }))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Drop paragraphs that contain nothing but whitespace.
pub fn remove_empty_paragraphs(html: &str) -> String {
    EMPTY_PARAGRAPH_RE.replace_all(html, "").into_owned()
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
