use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::paths::html_file_name;

/// An org active timestamp: `<2021-03-04 Thu>` or `<2021-03-04 Thu 10:15>`.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<(\d{4})-(\d{2})-(\d{2}) [a-zA-Z]{3}\s?(?:(\d{2}):(\d{2}))?>")
        .expect("timestamp pattern is valid")
});

// =============================================================================
// Pages
// =============================================================================

/// A single rendered document.
///
/// Pages are created once while the site tree is built and are read-only
/// afterwards. They are exposed to templates as `page`, and as entries of
/// `site.pages` for index-style templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Document title (from `#+TITLE:` or front matter)
    pub title: String,
    /// Name of the source file, e.g. `intro.org`
    pub source_file: String,
    /// Name of the output file, e.g. `intro.html`
    pub file_name: String,
    /// Converted body, ready to be inserted into a template
    pub html: String,
    /// Root-relative URL of the output file
    pub url: String,
    /// Publication date; `None` when the document has no parseable timestamp
    pub date: Option<NaiveDateTime>,
}

impl Page {
    pub fn new(
        title: String,
        source_file: String,
        raw_date: Option<&str>,
        html: String,
        url: String,
    ) -> Self {
        let file_name = html_file_name(&source_file);
        Self {
            title,
            source_file,
            file_name,
            html,
            url,
            date: raw_date.and_then(parse_timestamp),
        }
    }

    /// Comparator ordering pages by date, undated pages first.
    ///
    /// Used by the `sort_pages` template filter.
    pub fn by_date(a: &Page, b: &Page) -> Ordering {
        a.date.cmp(&b.date)
    }

    /// Comparator ordering pages by title.
    pub fn by_title(a: &Page, b: &Page) -> Ordering {
        a.title.cmp(&b.title)
    }
}

/// Parse an org timestamp into a date and time.
///
/// The time part is optional and defaults to midnight. Anything that does
/// not look like a timestamp, or names an impossible date, yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let caps = TIMESTAMP_RE.captures(raw.trim())?;

    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;

    let (hour, minute) = match (caps.get(4), caps.get(5)) {
        (Some(h), Some(m)) => (h.as_str().parse().ok()?, m.as_str().parse().ok()?),
        _ => (0, 0),
    };

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}
