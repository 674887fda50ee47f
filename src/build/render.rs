use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tera::{Context, Tera, Value};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::SiteConfig;

use super::document::Page;
use super::paths::join_folder;
use super::template::{TemplateSet, resolve_template};
use super::tree::DirectoryNode;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to load templates: {0}")]
    Load(#[source] tera::Error),

    #[error("templates directory not found: {0}")]
    TemplatesNotFound(PathBuf),

    #[error("failed to list templates: {0}")]
    ListTemplates(#[source] walkdir::Error),

    #[error("default template '{0}' does not exist")]
    MissingDefaultTemplate(String),

    #[error("failed to render {page} with template '{template}': {source}")]
    Template {
        page: String,
        template: String,
        source: tera::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

// =============================================================================
// Template contexts
// =============================================================================

/// Site-level information, exposed to templates as `site`.
#[derive(Debug, Clone, Serialize)]
pub struct SiteContext<'a> {
    pub name: &'a str,
    pub author_alias: &'a str,
    pub author_name: &'a str,
    pub root: &'a str,
    pub dateformat: &'a str,
    /// The whole site tree, for index pages
    pub pages: &'a DirectoryNode,
}

impl<'a> SiteContext<'a> {
    pub fn new(config: &'a SiteConfig, pages: &'a DirectoryNode) -> Self {
        Self {
            name: &config.name,
            author_alias: &config.alias,
            author_name: &config.fullname,
            root: &config.root,
            dateformat: &config.dateformat,
            pages,
        }
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// The template renderer, wrapping Tera.
pub struct Renderer {
    tera: Tera,
    default_template: String,
}

impl Renderer {
    /// Load every file below `templates_dir` as a template.
    ///
    /// Template names are `/`-separated paths relative to `templates_dir`.
    /// The directory is listed rather than globbed, so its own name may hold
    /// glob characters. Autoescaping is off because page bodies are already
    /// HTML.
    pub fn new(templates_dir: &Path, config: &SiteConfig) -> Result<Self, RenderError> {
        if !templates_dir.is_dir() {
            return Err(RenderError::TemplatesNotFound(templates_dir.to_path_buf()));
        }

        let files = template_files(templates_dir)?;
        let mut tera = Tera::default();
        tera.add_template_files(files).map_err(RenderError::Load)?;
        info!(count = tera.templates.len(), dir = %templates_dir.display(), "loaded templates");

        Self::from_tera(tera, config)
    }

    /// Wrap an already populated Tera instance.
    pub fn from_tera(mut tera: Tera, config: &SiteConfig) -> Result<Self, RenderError> {
        tera.autoescape_on(vec![]);
        tera.register_filter("datetime", DateTimeFilter::new(&config.dateformat));
        tera.register_filter("sort_pages", SortPagesFilter);

        if !tera.has_template(&config.default_template) {
            return Err(RenderError::MissingDefaultTemplate(
                config.default_template.clone(),
            ));
        }

        Ok(Self {
            tera,
            default_template: config.default_template.clone(),
        })
    }

    /// Render one page with the given template.
    ///
    /// `context` holds `site`; `page` is replaced on every call.
    pub fn render_page(
        &self,
        template: &str,
        page: &Page,
        context: &mut Context,
    ) -> Result<String, RenderError> {
        context.insert("page", page);

        self.tera
            .render(template, context)
            .map_err(|source| RenderError::Template {
                page: page.url.clone(),
                template: template.to_string(),
                source,
            })
    }

    /// Write a node's pages into `output_dir/folder`, then recurse into its
    /// children. Returns the number of pages written.
    ///
    /// `output_dir` itself must already exist; folders below it are created
    /// as needed. Existing files are overwritten.
    pub fn write_tree(
        &self,
        node: &DirectoryNode,
        output_dir: &Path,
        folder: &str,
        site: &SiteContext,
    ) -> Result<usize, RenderError> {
        let mut context = Context::new();
        context.insert("site", site);
        self.write_node(node, output_dir, folder, &mut context)
    }

    fn write_node(
        &self,
        node: &DirectoryNode,
        output_dir: &Path,
        folder: &str,
        context: &mut Context,
    ) -> Result<usize, RenderError> {
        let dir = if folder.is_empty() {
            output_dir.to_path_buf()
        } else {
            let dir = output_dir.join(folder);
            std::fs::create_dir_all(&dir).map_err(|source| RenderError::Io {
                path: dir.clone(),
                source,
            })?;
            dir
        };

        let mut written = 0;
        for page in node.pages() {
            let template = resolve_template(
                &self.tera,
                folder,
                &page.source_file,
                &self.default_template,
            );
            let html = self.render_page(&template, page, context)?;

            let path = dir.join(&page.file_name);
            std::fs::write(&path, html.as_bytes()).map_err(|source| RenderError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(url = %page.url, template = %template, "wrote page");
            written += 1;
        }

        for child in node.children() {
            written +=
                self.write_node(child, output_dir, &join_folder(folder, child.name()), context)?;
        }

        Ok(written)
    }
}

/// List the template files below `dir`, named by their relative path.
fn template_files(dir: &Path) -> Result<Vec<(PathBuf, Option<String>)>, RenderError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(RenderError::ListTemplates)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((entry.path().to_path_buf(), Some(name)));
    }
    Ok(files)
}

// =============================================================================
// Filters
// =============================================================================

/// `{{ page.date | datetime }}`: format a page date with the site's date
/// format, or with `format="..."` when given. A missing date renders as an
/// empty string.
struct DateTimeFilter {
    format: String,
}

impl DateTimeFilter {
    fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
        }
    }
}

impl tera::Filter for DateTimeFilter {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        if value.is_null() {
            return Ok(Value::String(String::new()));
        }

        let raw = value
            .as_str()
            .ok_or_else(|| tera::Error::msg("datetime filter expects a date string"))?;
        let date: NaiveDateTime = raw
            .parse()
            .map_err(|e| tera::Error::msg(format!("datetime filter: invalid date '{raw}': {e}")))?;

        let format = match args.get("format") {
            Some(format) => format
                .as_str()
                .ok_or_else(|| tera::Error::msg("datetime filter: `format` must be a string"))?,
            None => self.format.as_str(),
        };

        let mut formatted = String::new();
        write!(formatted, "{}", date.format(format))
            .map_err(|_| tera::Error::msg(format!("datetime filter: invalid format '{format}'")))?;
        Ok(Value::String(formatted))
    }
}

/// `{{ site.pages.children.blog | sort_pages(by="date", reverse=true) }}`:
/// order a folder (or a list of pages) with `Page::by_date` (the default,
/// undated pages first) or `Page::by_title`. Returns the list of pages.
struct SortPagesFilter;

impl tera::Filter for SortPagesFilter {
    fn filter(&self, value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let compare: fn(&Page, &Page) -> Ordering = match args.get("by").map(Value::as_str) {
            None | Some(Some("date")) => Page::by_date,
            Some(Some("title")) => Page::by_title,
            Some(_) => {
                return Err(tera::Error::msg(
                    "sort_pages: `by` must be \"date\" or \"title\"",
                ));
            }
        };
        let reverse = match args.get("reverse") {
            Some(reverse) => reverse
                .as_bool()
                .ok_or_else(|| tera::Error::msg("sort_pages: `reverse` must be a boolean"))?,
            None => false,
        };

        let mut pages: Vec<Page> = if value.is_object() {
            let node: DirectoryNode = tera::from_value(value.clone())
                .map_err(|e| tera::Error::msg(format!("sort_pages: expected a folder: {e}")))?;
            node.pages_sorted_by(compare).into_iter().cloned().collect()
        } else {
            let mut pages: Vec<Page> = tera::from_value(value.clone())
                .map_err(|e| tera::Error::msg(format!("sort_pages: expected pages: {e}")))?;
            pages.sort_by(compare);
            pages
        };
        if reverse {
            pages.reverse();
        }

        tera::to_value(pages).map_err(|e| tera::Error::msg(format!("sort_pages: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn renderer(templates: &[(&str, &str)]) -> Renderer {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates.to_vec()).unwrap();
        Renderer::from_tera(tera, &SiteConfig::default().validated().unwrap()).unwrap()
    }

    fn page(source_file: &str, date: Option<&str>, url: &str) -> Page {
        Page::new(
            "A <Title>".to_string(),
            source_file.to_string(),
            date,
            "<p>body</p>".to_string(),
            url.to_string(),
        )
    }

    fn base(config: &SiteConfig, tree: &DirectoryNode) -> Context {
        let mut base = Context::new();
        base.insert("site", &SiteContext::new(config, tree));
        base
    }

    #[test]
    fn test_missing_default_template() {
        let mut tera = Tera::default();
        tera.add_raw_template("other.html", "").unwrap();
        let result = Renderer::from_tera(tera, &SiteConfig::default());
        assert!(matches!(result, Err(RenderError::MissingDefaultTemplate(name)) if name == "default.html"));
    }

    #[test]
    fn test_render_page_is_not_escaped() {
        let renderer = renderer(&[("default.html", "{{ page.title }}|{{ page.html }}|{{ site.name }}")]);
        let config = SiteConfig::default();
        let tree = DirectoryNode::new("");

        let html = renderer
            .render_page("default.html", &page("a.org", None, "/a.html"), &mut base(&config, &tree))
            .unwrap();
        assert_eq!(html, "A <Title>|<p>body</p>|Default OrgSite");
    }

    #[test]
    fn test_datetime_filter() {
        let renderer = renderer(&[(
            "default.html",
            "{{ page.date | datetime }}/{{ page.date | datetime(format=\"%Y\") }}",
        )]);
        let config = SiteConfig::default();
        let tree = DirectoryNode::new("");

        let dated = page("a.org", Some("<2021-03-04 Thu 10:15>"), "/a.html");
        let html = renderer
            .render_page("default.html", &dated, &mut base(&config, &tree))
            .unwrap();
        assert_eq!(html, "04 Mar 2021 at 10:15/2021");

        let undated = page("b.org", None, "/b.html");
        let html = renderer
            .render_page("default.html", &undated, &mut base(&config, &tree))
            .unwrap();
        assert_eq!(html, "/");
    }

    #[test]
    fn test_render_error_names_page_and_template() {
        let renderer = renderer(&[("default.html", "{{ page.nope.deeper }}")]);
        let config = SiteConfig::default();
        let tree = DirectoryNode::new("");

        let err = renderer
            .render_page("default.html", &page("a.org", None, "/a.html"), &mut base(&config, &tree))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("/a.html"));
        assert!(message.contains("default.html"));
    }

    #[test]
    fn test_write_tree_mirrors_folders_and_picks_templates() {
        let renderer = renderer(&[
            ("default.html", "default:{{ page.title }}"),
            ("blog_default.html", "blog:{{ page.url }}"),
            ("blog_about.html", "about"),
        ]);
        let config = SiteConfig::default().validated().unwrap();

        let mut root = DirectoryNode::new("");
        root.add_page(page("index.org", None, "/index.html")).unwrap();
        let blog = root.create_child("blog").unwrap();
        blog.add_page(page("post.org", None, "/blog/post.html")).unwrap();
        blog.add_page(page("about.org", None, "/blog/about.html")).unwrap();
        blog.create_child("2021").unwrap();

        let out = tempfile::tempdir().unwrap();
        let written = renderer
            .write_tree(&root, out.path(), "", &SiteContext::new(&config, &root))
            .unwrap();

        assert_eq!(written, 3);
        let read = |rel: &str| std::fs::read_to_string(out.path().join(rel)).unwrap();
        assert_eq!(read("index.html"), "default:A <Title>");
        assert_eq!(read("blog/post.html"), "blog:/blog/post.html");
        assert_eq!(read("blog/about.html"), "about");
        assert!(out.path().join("blog/2021").is_dir());
    }

    #[test]
    fn test_site_tree_is_available_to_templates() {
        let renderer = renderer(&[(
            "default.html",
            "{% for p in site.pages.children.blog.pages %}{{ p.url }};{% endfor %}",
        )]);
        let config = SiteConfig::default().validated().unwrap();

        let mut root = DirectoryNode::new("");
        root.add_page(page("index.org", None, "/index.html")).unwrap();
        let blog = root.create_child("blog").unwrap();
        blog.add_page(page("one.org", None, "/blog/one.html")).unwrap();
        blog.add_page(page("two.org", None, "/blog/two.html")).unwrap();

        let out = tempfile::tempdir().unwrap();
        renderer
            .write_tree(&root, out.path(), "", &SiteContext::new(&config, &root))
            .unwrap();

        let index = std::fs::read_to_string(out.path().join("index.html")).unwrap();
        assert_eq!(index, "/blog/one.html;/blog/two.html;");
    }

    #[test]
    fn test_context_is_reused_across_pages() {
        let renderer = renderer(&[("default.html", "{{ site.name }}:{{ page.url }}")]);
        let config = SiteConfig::default();
        let tree = DirectoryNode::new("");
        let mut context = base(&config, &tree);

        let first = renderer
            .render_page("default.html", &page("a.org", None, "/a.html"), &mut context)
            .unwrap();
        let second = renderer
            .render_page("default.html", &page("b.org", None, "/b.html"), &mut context)
            .unwrap();

        assert_eq!(first, "Default OrgSite:/a.html");
        assert_eq!(second, "Default OrgSite:/b.html");
    }

    fn titled(title: &str, date: Option<&str>) -> Page {
        Page::new(
            title.to_string(),
            format!("{}.org", title.to_lowercase()),
            date,
            String::new(),
            format!("/blog/{}.html", title.to_lowercase()),
        )
    }

    fn blog_tree() -> DirectoryNode {
        let mut root = DirectoryNode::new("");
        let blog = root.create_child("blog").unwrap();
        blog.add_page(titled("Zeta", Some("<2023-05-01 Mon>"))).unwrap();
        blog.add_page(titled("Mid", None)).unwrap();
        blog.add_page(titled("Alpha", Some("<2019-05-01 Wed>"))).unwrap();
        root
    }

    #[test]
    fn test_sort_pages_filter() {
        let renderer = renderer(&[(
            "default.html",
            concat!(
                "{% for p in site.pages.children.blog | sort_pages %}{{ p.title }};{% endfor %}|",
                "{% for p in site.pages.children.blog | sort_pages(by=\"date\", reverse=true) %}",
                "{{ p.title }};{% endfor %}|",
                "{% for p in site.pages.children.blog.pages | sort_pages(by=\"title\") %}",
                "{{ p.title }};{% endfor %}",
            ),
        )]);
        let config = SiteConfig::default();
        let tree = blog_tree();

        let html = renderer
            .render_page("default.html", &page("index.org", None, "/index.html"), &mut base(&config, &tree))
            .unwrap();
        assert_eq!(html, "Mid;Alpha;Zeta;|Zeta;Alpha;Mid;|Alpha;Mid;Zeta;");
    }

    #[test]
    fn test_sort_pages_rejects_unknown_key() {
        let renderer = renderer(&[(
            "default.html",
            "{% for p in site.pages.children.blog | sort_pages(by=\"size\") %}{% endfor %}",
        )]);
        let config = SiteConfig::default();
        let tree = blog_tree();

        let result = renderer.render_page(
            "default.html",
            &page("index.org", None, "/index.html"),
            &mut base(&config, &tree),
        );
        assert!(matches!(result, Err(RenderError::Template { .. })));
    }

    #[test]
    fn test_templates_dir_with_glob_characters() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("site [draft]").join("templates");
        std::fs::create_dir_all(templates.join("partials")).unwrap();
        std::fs::write(
            templates.join("default.html"),
            "{% include \"partials/head.html\" %}{{ page.title }}",
        )
        .unwrap();
        std::fs::write(templates.join("partials/head.html"), "<head/>").unwrap();

        let config = SiteConfig::default().validated().unwrap();
        let renderer = Renderer::new(&templates, &config).unwrap();
        assert!(renderer.tera.has_template("partials/head.html"));

        let tree = DirectoryNode::new("");
        let html = renderer
            .render_page("default.html", &page("a.org", None, "/a.html"), &mut base(&config, &tree))
            .unwrap();
        assert_eq!(html, "<head/>A <Title>");
    }

    #[test]
    fn test_missing_templates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = Renderer::new(&dir.path().join("templates"), &SiteConfig::default());
        assert!(matches!(result, Err(RenderError::TemplatesNotFound(_))));
    }
}
