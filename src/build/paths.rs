//! Path and URL conversion utilities.
//!
//! Folders are handled as `/`-separated strings relative to the org root
//! (the root folder is the empty string), independent of the host's path
//! separator. This module converts between:
//! - Source file names and output file names
//! - Folders and page URLs
//! - Folders and template name prefixes

/// Replace the extension of a source file name with `.html`.
///
/// # Examples
/// ```ignore
/// html_file_name("intro.org") => "intro.html"
/// html_file_name("notes.txt") => "notes.html"
/// html_file_name("README") => "README.html"
/// ```
pub fn html_file_name(source_file: &str) -> String {
    let stem = match source_file.rfind('.') {
        // a leading dot marks a hidden file, not an extension
        Some(pos) if pos > 0 => &source_file[..pos],
        _ => source_file,
    };
    format!("{stem}.html")
}

/// Build the URL of a page from the site root, its folder and its output
/// file name.
///
/// `root` is expected without a trailing slash (see `SiteConfig::validated`).
///
/// # Examples
/// ```ignore
/// page_url("/blog", "notes", "x.html") => "/blog/notes/x.html"
/// page_url("/blog", "", "x.html") => "/blog/x.html"
/// page_url("", "", "x.html") => "/x.html"
/// ```
pub fn page_url(root: &str, folder: &str, file_name: &str) -> String {
    if folder.is_empty() {
        format!("{root}/{file_name}")
    } else {
        format!("{root}/{folder}/{file_name}")
    }
}

/// Append a subfolder name to a folder path.
pub fn join_folder(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// The template name prefix for a folder: its segments joined with `_`,
/// plus a trailing `_`. The root folder has no prefix.
///
/// # Examples
/// ```ignore
/// template_prefix("") => ""
/// template_prefix("a/b") => "a_b_"
/// ```
pub fn template_prefix(folder: &str) -> String {
    let segments: Vec<&str> = folder.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        String::new()
    } else {
        format!("{}_", segments.join("_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_file_name() {
        assert_eq!(html_file_name("intro.org"), "intro.html");
        assert_eq!(html_file_name("notes.txt"), "notes.html");
        assert_eq!(html_file_name("post.md"), "post.html");
        assert_eq!(html_file_name("v1.2.org"), "v1.2.html");
        assert_eq!(html_file_name("README"), "README.html");
        assert_eq!(html_file_name(".hidden"), ".hidden.html");
    }

    #[test]
    fn test_page_url_with_folder() {
        assert_eq!(page_url("/blog", "notes", "x.html"), "/blog/notes/x.html");
        assert_eq!(page_url("/blog", "a/b", "x.html"), "/blog/a/b/x.html");
    }

    #[test]
    fn test_page_url_root_folder() {
        assert_eq!(page_url("/blog", "", "x.html"), "/blog/x.html");
        assert_eq!(page_url("", "", "x.html"), "/x.html");
    }

    #[test]
    fn test_join_folder() {
        assert_eq!(join_folder("", "blog"), "blog");
        assert_eq!(join_folder("blog", "2021"), "blog/2021");
    }

    #[test]
    fn test_template_prefix() {
        assert_eq!(template_prefix(""), "");
        assert_eq!(template_prefix("sec"), "sec_");
        assert_eq!(template_prefix("a/b"), "a_b_");
    }
}
