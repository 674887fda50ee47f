//! Org document conversion.
//!
//! Handles the subset of org syntax that site pages use:
//!
//! - `#+TITLE:` and `#+DATE:` keywords (other keywords are dropped)
//! - headlines, shifted by the heading offset
//! - paragraphs, plain lists and horizontal rules
//! - `#+BEGIN_SRC`, `#+BEGIN_EXAMPLE`, `#+BEGIN_QUOTE` and other blocks
//! - inline markup: `*bold*`, `/italic/`, `_underline_`, `+strike+`,
//!   `=verbatim=`, `~code~`, and `[[target][description]]` links
//!
//! Every blank line after the first between two blocks becomes an empty
//! paragraph, which `remove_empty_p` strips again.

use std::sync::LazyLock;

use regex::Regex;

use super::format::{ContentFormat, ConvertedDocument, FormatContext, FormatError, escape_html};

static LIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([-+]|\d+[.)])\s+(.*)$").expect("list item pattern is valid")
});

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]]+)\](?:\[([^\]]+)\])?\]").expect("link pattern is valid")
});

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// Emphasis markers: character, HTML tag, whether the content may hold
/// further markup.
const MARKERS: [(char, &str, bool); 6] = [
    ('*', "b", true),
    ('/', "i", true),
    ('_', "u", true),
    ('+', "del", true),
    ('=', "code", false),
    ('~', "code", false),
];

/// Org format implementation.
pub struct OrgFormat;

impl ContentFormat for OrgFormat {
    fn name(&self) -> &'static str {
        "org"
    }

    fn extensions(&self) -> &[&'static str] {
        &["org"]
    }

    fn convert(&self, raw: &str, ctx: &FormatContext) -> Result<ConvertedDocument, FormatError> {
        convert_org(raw, ctx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Blocks being accumulated line by line.
#[derive(Default)]
struct Pending {
    paragraph: Vec<String>,
    list: Option<(ListKind, Vec<String>)>,
}

impl Pending {
    fn flush(&mut self, out: &mut String) {
        if !self.paragraph.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", render_inline(&self.paragraph.join("\n"))));
            self.paragraph.clear();
        }
        if let Some((kind, items)) = self.list.take() {
            out.push_str(&format!("<{}>\n", kind.tag()));
            for item in items {
                out.push_str(&format!("<li>{}</li>\n", render_inline(&item)));
            }
            out.push_str(&format!("</{}>\n", kind.tag()));
        }
    }
}

/// Convert an org document to HTML.
pub fn convert_org(raw: &str, ctx: &FormatContext) -> Result<ConvertedDocument, FormatError> {
    let lines: Vec<&str> = raw.lines().collect();
    let mut doc = ConvertedDocument::default();
    let mut out = String::new();
    let mut pending = Pending::default();
    let mut blank_run = 0;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();
        i += 1;

        if trimmed.is_empty() {
            pending.flush(&mut out);
            blank_run += 1;
            if blank_run > 1 && !out.is_empty() {
                out.push_str("<p></p>\n");
            }
            continue;
        }
        blank_run = 0;

        if let Some((key, value)) = keyword(trimmed) {
            let key = key.to_ascii_uppercase();
            if let Some(block) = key.strip_prefix("BEGIN_") {
                pending.flush(&mut out);
                let start = i;
                let end = find_block_end(&lines, start, block).ok_or_else(|| {
                    FormatError::Syntax {
                        line: start,
                        message: format!("#+BEGIN_{block} is never closed"),
                    }
                })?;
                out.push_str(&render_block(block, value, &lines[start..end]));
                i = end + 1;
                continue;
            }
            match key.as_str() {
                "TITLE" => doc.title = Some(value.to_string()).filter(|t| !t.is_empty()),
                "DATE" => doc.date = Some(value.to_string()).filter(|d| !d.is_empty()),
                _ => {}
            }
            continue;
        }

        // `# comment`
        if trimmed == "#" || trimmed.starts_with("# ") {
            continue;
        }

        if let Some((stars, text)) = headline(line) {
            pending.flush(&mut out);
            let level = ctx.heading_level(stars);
            out.push_str(&format!("<h{level}>{}</h{level}>\n", render_inline(text)));
            continue;
        }

        if trimmed.len() >= 5 && trimmed.chars().all(|c| c == '-') {
            pending.flush(&mut out);
            out.push_str("<hr />\n");
            continue;
        }

        if let Some(caps) = LIST_ITEM_RE.captures(line) {
            let kind = if caps[1].starts_with(['-', '+']) {
                ListKind::Unordered
            } else {
                ListKind::Ordered
            };
            let continues = matches!(&pending.list, Some((current, _)) if *current == kind);
            if !continues {
                pending.flush(&mut out);
                pending.list = Some((kind, Vec::new()));
            }
            if let Some((_, items)) = &mut pending.list {
                items.push(caps[2].to_string());
            }
            continue;
        }

        // An indented line directly under a list item continues that item.
        if line.starts_with(char::is_whitespace) {
            if let Some((_, items)) = &mut pending.list {
                if let Some(last) = items.last_mut() {
                    last.push('\n');
                    last.push_str(trimmed);
                    continue;
                }
            }
        }

        if pending.list.is_some() {
            pending.flush(&mut out);
        }
        pending.paragraph.push(trimmed.to_string());
    }

    pending.flush(&mut out);
    doc.html = out;
    Ok(doc)
}

/// Split a `#+KEY: value` or `#+BEGIN_X args` line.
fn keyword(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("#+")?;
    let end = rest
        .find(|c: char| c == ':' || c.is_whitespace())
        .unwrap_or(rest.len());
    let key = &rest[..end];
    if key.is_empty() {
        return None;
    }
    let value = rest[end..].strip_prefix(':').unwrap_or(&rest[end..]).trim();
    Some((key, value))
}

/// Recognize a headline and return its level and text without tags.
fn headline(line: &str) -> Option<(usize, &str)> {
    let stars = line.chars().take_while(|&c| c == '*').count();
    if stars == 0 {
        return None;
    }
    let text = line[stars..].strip_prefix(' ')?.trim();

    // trailing `:tag1:tag2:`
    let text = match text.rsplit_once(char::is_whitespace) {
        Some((head, tags)) if tags.len() > 1 && tags.starts_with(':') && tags.ends_with(':') => {
            head.trim_end()
        }
        _ => text,
    };
    Some((stars, text))
}

/// Index of the `#+END_<block>` line matching a block opened before `start`.
fn find_block_end(lines: &[&str], start: usize, block: &str) -> Option<usize> {
    let end_marker = format!("#+END_{block}");
    (start..lines.len()).find(|&j| lines[j].trim().eq_ignore_ascii_case(&end_marker))
}

fn render_block(block: &str, args: &str, body: &[&str]) -> String {
    let name = block.to_ascii_lowercase();
    match name.as_str() {
        "src" => {
            let lang = args.split_whitespace().next().unwrap_or("");
            format!(
                "<pre class=\"src src-{}\">{}</pre>\n",
                escape_html(lang),
                escape_html(&body.join("\n"))
            )
        }
        "example" => format!("<pre class=\"example\">{}</pre>\n", escape_html(&body.join("\n"))),
        "quote" => format!("<blockquote>\n{}</blockquote>\n", render_paragraphs(body)),
        _ => format!(
            "<div class=\"{}\">\n{}</div>\n",
            escape_html(&name),
            render_paragraphs(body)
        ),
    }
}

/// Render block content as plain paragraphs separated by blank lines.
fn render_paragraphs(body: &[&str]) -> String {
    let mut out = String::new();
    let mut paragraph: Vec<&str> = Vec::new();
    for line in body.iter().map(|l| l.trim()).chain(std::iter::once("")) {
        if line.is_empty() {
            if !paragraph.is_empty() {
                out.push_str(&format!("<p>{}</p>\n", render_inline(&paragraph.join("\n"))));
                paragraph.clear();
            }
        } else {
            paragraph.push(line);
        }
    }
    out
}

/// Render inline markup: links first, then emphasis in the text between them.
pub fn render_inline(text: &str) -> String {
    let mut out = String::new();
    let mut last = 0;
    for caps in LINK_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&render_emphasis(&text[last..whole.start()]));
        out.push_str(&render_link(&caps[1], caps.get(2).map(|d| d.as_str())));
        last = whole.end();
    }
    out.push_str(&render_emphasis(&text[last..]));
    out
}

fn render_link(target: &str, description: Option<&str>) -> String {
    let href = target.strip_prefix("file:").unwrap_or(target);
    match description {
        Some(desc) => format!("<a href=\"{}\">{}</a>", escape_html(href), render_emphasis(desc)),
        None if is_image(href) => format!("<img src=\"{}\" alt=\"\" />", escape_html(href)),
        None => format!("<a href=\"{0}\">{0}</a>", escape_html(href)),
    }
}

fn is_image(target: &str) -> bool {
    target
        .rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn render_emphasis(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let marker = MARKERS.iter().find(|(m, _, _)| *m == c);
        if let Some(&(marker, tag, nested)) = marker {
            let opens = i == 0 || is_pre_marker(chars[i - 1]);
            if let Some(close) = opens.then(|| find_closing(&chars, i, marker)).flatten() {
                let inner: String = chars[i + 1..close].iter().collect();
                let body = if nested {
                    render_emphasis(&inner)
                } else {
                    escape_html(&inner)
                };
                out.push_str(&format!("<{tag}>{body}</{tag}>"));
                i = close + 1;
                continue;
            }
        }
        out.push_str(&escape_html(c.encode_utf8(&mut [0; 4])));
        i += 1;
    }
    out
}

fn find_closing(chars: &[char], open: usize, marker: char) -> Option<usize> {
    let first = *chars.get(open + 1)?;
    if first.is_whitespace() || first == marker {
        return None;
    }
    (open + 2..chars.len()).find(|&j| {
        chars[j] == marker
            && !chars[j - 1].is_whitespace()
            && chars.get(j + 1).is_none_or(|&next| is_post_marker(next))
    })
}

fn is_pre_marker(c: char) -> bool {
    c.is_whitespace() || "-({'\"".contains(c)
}

fn is_post_marker(c: char) -> bool {
    c.is_whitespace() || "-.,;:!?')}\"".contains(c)
}
