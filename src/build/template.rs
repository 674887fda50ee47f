//! Template selection.
//!
//! Templates live in one flat namespace, so folder-scoped templates are
//! emulated with a name prefix: a page in `blog/2021` first looks for
//! `blog_2021_<page>.html`, then `blog_2021_<default>`, then `<default>`.

use tera::Tera;
use tracing::debug;

use super::paths::{html_file_name, template_prefix};

/// Anything that can answer "is there a template with this name?".
pub trait TemplateSet {
    fn has_template(&self, name: &str) -> bool;
}

impl TemplateSet for Tera {
    fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

impl TemplateSet for [&str] {
    fn has_template(&self, name: &str) -> bool {
        self.contains(&name)
    }
}

/// Pick the template for a page, first hit wins:
///
/// 1. `<prefix><page>.html`, a template for exactly this page
/// 2. `<prefix><default>`, the folder's default template
/// 3. `<default>`, the site-wide default
///
/// The last tier is returned without checking, so a missing site-wide
/// default surfaces when the template is rendered.
pub fn resolve_template<T>(
    templates: &T,
    folder: &str,
    source_file: &str,
    default_template: &str,
) -> String
where
    T: TemplateSet + ?Sized,
{
    let prefix = template_prefix(folder);

    let page_template = format!("{prefix}{}", html_file_name(source_file));
    if templates.has_template(&page_template) {
        debug!(folder, source_file, template = %page_template, "using page template");
        return page_template;
    }

    let folder_template = format!("{prefix}{default_template}");
    if templates.has_template(&folder_template) {
        debug!(folder, source_file, template = %folder_template, "using folder template");
        return folder_template;
    }

    default_template.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATES: &[&str] = &["sec_page.html", "sec_default.html", "default.html"];

    #[test]
    fn test_page_template_wins() {
        assert_eq!(
            resolve_template(TEMPLATES, "sec", "page.org", "default.html"),
            "sec_page.html"
        );
    }

    #[test]
    fn test_folder_default_is_second() {
        assert_eq!(
            resolve_template(TEMPLATES, "sec", "other.org", "default.html"),
            "sec_default.html"
        );
    }

    #[test]
    fn test_global_default_is_last() {
        assert_eq!(
            resolve_template(TEMPLATES, "missing", "other.org", "default.html"),
            "default.html"
        );
        assert_eq!(
            resolve_template(TEMPLATES, "", "page.org", "default.html"),
            "default.html"
        );
    }

    #[test]
    fn test_nested_folder_prefix() {
        let templates: &[&str] = &["a_b_default.html", "default.html", "a_default.html"];
        assert_eq!(
            resolve_template(templates, "a/b", "x.org", "default.html"),
            "a_b_default.html"
        );
        assert_eq!(
            resolve_template(templates, "a", "x.org", "default.html"),
            "a_default.html"
        );
    }

    #[test]
    fn test_root_page_template() {
        let templates: &[&str] = &["index.html", "default.html"];
        assert_eq!(
            resolve_template(templates, "", "index.org", "default.html"),
            "index.html"
        );
    }

    #[test]
    fn test_tera_template_set() {
        let mut tera = Tera::default();
        tera.add_raw_template("blog_default.html", "blog").unwrap();
        tera.add_raw_template("default.html", "page").unwrap();

        assert!(tera.has_template("blog_default.html"));
        assert!(!tera.has_template("blog_post.html"));
        assert_eq!(
            resolve_template(&tera, "blog", "post.org", "default.html"),
            "blog_default.html"
        );
    }
}
