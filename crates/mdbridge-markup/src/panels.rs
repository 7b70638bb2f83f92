//! Callout panels detected from keyword-prefixed blockquotes.
//!
//! A blockquote whose first paragraph starts with `Info:`, `Warning:` or `Error:`
//! (any case, optionally bold) becomes a panel. Other blockquotes are left alone.
//!
//! The panel body is split into top-level blocks: paragraphs yield their inner
//! markup (further split on blank lines), every other block element is kept whole.

use std::sync::LazyLock;

use regex::Regex;

use crate::html::{elements, replace_elements};

static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*<p>\s*(?:<strong>\s*)?(info|warning|error)\s*(?:</strong>\s*:|:\s*(?:</strong>)?)\s*(?:<br\s*/?>\s*)?",
    )
    .unwrap()
});

static BLANK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

const BLOCK_TAGS: [&str; 8] = ["<ul", "<ol", "<table", "<pre", "<blockquote", "<h", "<hr", "<ac:"];

/// Kind of callout panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Info,
    Warning,
    Error,
}

impl PanelKind {
    /// Match a prefix keyword, ignoring case.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Display title for the panel.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }

    /// Macro name shared by the wiki storage format and issue markup.
    ///
    /// Both targets style `note` as a yellow caution box and `warning` as red.
    #[must_use]
    pub fn macro_name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "note",
            Self::Error => "warning",
        }
    }
}

/// A detected callout with its body split into paragraphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelBlock {
    pub kind: PanelKind,
    /// Paragraph fragments (inline markup preserved), keyword removed, empties dropped.
    pub paragraphs: Vec<String>,
}

impl PanelBlock {
    /// Detect a panel from the inner markup of a blockquote.
    #[must_use]
    pub fn detect(blockquote_inner: &str) -> Option<Self> {
        let caps = PREFIX_RE.captures(blockquote_inner)?;
        let kind = PanelKind::from_keyword(&caps[1])?;
        let body = &blockquote_inner[caps.get(0)?.end()..];

        // The prefix match consumed the opening `<p>` of the first paragraph.
        let (first, rest) = body
            .find("</p>")
            .map_or((body, ""), |end| (&body[..end], &body[end + "</p>".len()..]));

        let mut paragraphs = Vec::new();
        push_paragraphs(&mut paragraphs, first);
        split_blocks(rest, &mut paragraphs);
        Some(Self { kind, paragraphs })
    }

    /// Whether a fragment is block markup that must not be wrapped in a paragraph.
    #[must_use]
    pub fn is_block_fragment(fragment: &str) -> bool {
        BLOCK_TAGS.iter().any(|tag| fragment.starts_with(tag))
            || (fragment.starts_with('\u{E000}')
                && fragment.ends_with('\u{E001}')
                && fragment.matches('\u{E000}').count() == 1)
    }
}

/// Split top-level blocks: `<p>` contributes its paragraphs, other elements stay whole.
fn split_blocks(html: &str, blocks: &mut Vec<String>) {
    let mut pos = 0;
    while pos < html.len() {
        let rest = html[pos..].trim_start();
        if rest.is_empty() {
            break;
        }
        pos = html.len() - rest.len();

        let name = rest.strip_prefix('<').map_or("", tag_name);
        if name.is_empty() {
            let end = rest.find('\n').unwrap_or(rest.len());
            push_paragraphs(blocks, &rest[..end]);
            pos += end;
            continue;
        }

        match elements(rest, name).into_iter().next().filter(|e| e.start == 0) {
            Some(element) if name.eq_ignore_ascii_case("p") => {
                push_paragraphs(blocks, element.inner);
                pos += element.end;
            }
            Some(element) => {
                blocks.push(rest[..element.end].to_owned());
                pos += element.end;
            }
            None => {
                // Void or unclosed tag.
                let end = rest.find('>').map_or(rest.len(), |i| i + 1);
                blocks.push(rest[..end].to_owned());
                pos += end;
            }
        }
    }
}

fn tag_name(tag: &str) -> &str {
    let end = tag
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == ':' || c == '-'))
        .unwrap_or(tag.len());
    &tag[..end]
}

fn push_paragraphs(blocks: &mut Vec<String>, text: &str) {
    blocks.extend(
        BLANK_LINE_RE
            .split(text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned),
    );
}

/// Replace every panel blockquote with `render(panel)`.
pub(crate) fn replace_panels<F>(html: &str, render: F) -> String
where
    F: Fn(&PanelBlock) -> String,
{
    replace_elements(html, "blockquote", |element| {
        match PanelBlock::detect(element.inner) {
            Some(panel) => render(&panel),
            None => html[element.start..element.end].to_owned(),
        }
    })
}
