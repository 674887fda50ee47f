//! Markdown document conversion.
//!
//! Markdown pages declare their title and date in a YAML front matter block:
//!
//! ```markdown
//! ---
//! title: My Page
//! date: <2021-03-04 Thu 10:15>
//! ---
//!
//! # Content starts here
//! ```

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use serde::Deserialize;

use super::format::{ContentFormat, ConvertedDocument, FormatContext, FormatError};

/// Markdown format implementation, using pulldown-cmark.
pub struct MarkdownFormat;

impl ContentFormat for MarkdownFormat {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extensions(&self) -> &[&'static str] {
        &["md", "markdown"]
    }

    fn convert(&self, raw: &str, ctx: &FormatContext) -> Result<ConvertedDocument, FormatError> {
        let parsed = parse_front_matter(raw)?;
        Ok(ConvertedDocument {
            title: parsed.front_matter.title.filter(|t| !t.trim().is_empty()),
            date: parsed.front_matter.date,
            html: render_markdown(parsed.content, ctx),
        })
    }
}

/// Front matter fields the site uses. Anything else is ignored.
#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    title: Option<String>,
    date: Option<String>,
}

struct ParsedContent<'a> {
    front_matter: FrontMatter,
    content: &'a str,
}

/// Split a leading `---` delimited YAML block from the markdown content.
///
/// Content without a complete front matter block is returned whole with
/// empty front matter. A block that is not valid YAML is an error.
fn parse_front_matter(content: &str) -> Result<ParsedContent<'_>, FormatError> {
    let content = content.trim_start();

    let Some(after_opening) = content.strip_prefix("---") else {
        return Ok(ParsedContent {
            front_matter: FrontMatter::default(),
            content,
        });
    };

    let Some(closing_pos) = after_opening.find("\n---") else {
        return Ok(ParsedContent {
            front_matter: FrontMatter::default(),
            content,
        });
    };

    let yaml = after_opening[..closing_pos].trim_start_matches('\n');
    let rest = &after_opening[closing_pos + 4..];
    // the rest of the closing delimiter line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);

    let front_matter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok(ParsedContent {
        front_matter,
        content: body.trim_start_matches('\n'),
    })
}

/// Render markdown to HTML, shifting heading levels by the offset.
fn render_markdown(markdown: &str, ctx: &FormatContext) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Start(Tag::Heading {
            level,
            id,
            classes,
            attrs,
        }) => Event::Start(Tag::Heading {
            level: shift_heading(level, ctx),
            id,
            classes,
            attrs,
        }),
        Event::End(TagEnd::Heading(level)) => Event::End(TagEnd::Heading(shift_heading(level, ctx))),
        _ => event,
    });

    let mut html_output = String::new();
    html::push_html(&mut html_output, events);
    html_output
}

fn shift_heading(level: HeadingLevel, ctx: &FormatContext) -> HeadingLevel {
    HeadingLevel::try_from(ctx.heading_level(level as usize)).unwrap_or(HeadingLevel::H6)
}
