//! Helpers for scanning the intermediate HTML.
//!
//! The emitters rewrite HTML with pattern passes. Nested constructs (lists inside
//! lists, tables, blockquotes) need balanced matching, which regular expressions
//! cannot express, so [`elements`] walks the markup and pairs open and close tags.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// A balanced element found by [`elements`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element<'a> {
    /// Byte range of the whole element, open tag to close tag.
    pub start: usize,
    pub end: usize,
    /// The opening tag including angle brackets.
    pub open_tag: &'a str,
    /// Markup between the opening and closing tags.
    pub inner: &'a str,
}

impl Element<'_> {
    /// Value of an attribute on the opening tag.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        attribute(self.open_tag, name)
    }
}

/// Remove every tag, keeping text content.
#[must_use]
pub fn strip_tags(html: &str) -> Cow<'_, str> {
    TAG_RE.replace_all(html, "")
}

/// Decode HTML entities (`&lt;`, `&amp;`, `&#39;`, ...).
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Text content of a fragment: tags stripped, entities decoded, trimmed.
#[must_use]
pub fn text_content(html: &str) -> String {
    decode_entities(&strip_tags(html)).trim().to_owned()
}

/// Read a double-quoted attribute from a single tag.
///
/// The returned value has entities decoded.
#[must_use]
pub fn attribute(tag: &str, name: &str) -> Option<String> {
    let needle = format!("{name}=\"");
    let mut search_from = 0;
    while let Some(found) = tag[search_from..].find(&needle) {
        let pos = search_from + found;
        let preceded_by_space = tag[..pos]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        let value_start = pos + needle.len();
        if preceded_by_space {
            let value_end = tag[value_start..].find('"')? + value_start;
            return Some(decode_entities(&tag[value_start..value_end]).into_owned());
        }
        search_from = value_start;
    }
    None
}

/// Find outermost `<tag>` elements, pairing nested tags of the same name.
///
/// `<th` does not match `<thead`: the tag name must be followed by `>`,
/// whitespace or `/`. Unclosed elements are ignored.
#[must_use]
pub fn elements<'a>(html: &'a str, tag: &str) -> Vec<Element<'a>> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_open(html, &open, pos) {
        let Some(open_end) = html[start..].find('>').map(|i| start + i + 1) else {
            break;
        };
        let mut depth = 1;
        let mut cursor = open_end;
        let mut closed = None;
        while depth > 0 {
            let next_open = find_open(html, &open, cursor);
            let Some(next_close) = html[cursor..].find(&close).map(|i| cursor + i) else {
                break;
            };
            match next_open {
                Some(o) if o < next_close => {
                    depth += 1;
                    cursor = o + open.len();
                }
                _ => {
                    depth -= 1;
                    cursor = next_close + close.len();
                    if depth == 0 {
                        closed = Some(next_close);
                    }
                }
            }
        }
        let Some(close_start) = closed else {
            pos = open_end;
            continue;
        };
        found.push(Element {
            start,
            end: close_start + close.len(),
            open_tag: &html[start..open_end],
            inner: &html[open_end..close_start],
        });
        pos = close_start + close.len();
    }

    found
}

/// Replace every outermost `<tag>` element with the result of `f`.
pub fn replace_elements<F>(html: &str, tag: &str, mut f: F) -> String
where
    F: FnMut(&Element<'_>) -> String,
{
    let found = elements(html, tag);
    if found.is_empty() {
        return html.to_owned();
    }
    let mut result = String::with_capacity(html.len());
    let mut last = 0;
    for element in &found {
        result.push_str(&html[last..element.start]);
        result.push_str(&f(element));
        last = element.end;
    }
    result.push_str(&html[last..]);
    result
}

/// Inner markup of each top-level `<li>` in a list body.
#[must_use]
pub fn list_items(list_inner: &str) -> Vec<&str> {
    elements(list_inner, "li").into_iter().map(|e| e.inner).collect()
}

/// Rows of a table as tag-stripped, trimmed cell markup, header and body rows alike.
///
/// Entities are left encoded.
#[must_use]
pub fn table_rows(table_inner: &str) -> Vec<Vec<String>> {
    elements(table_inner, "tr")
        .into_iter()
        .map(|row| {
            let mut cells: Vec<(usize, String)> = elements(row.inner, "th")
                .into_iter()
                .chain(elements(row.inner, "td"))
                .map(|cell| (cell.start, strip_tags(cell.inner).trim().to_owned()))
                .collect();
            cells.sort_by_key(|(start, _)| *start);
            cells.into_iter().map(|(_, text)| text).collect()
        })
        .collect()
}

fn find_open(html: &str, open: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(found) = html.get(pos..)?.find(open) {
        let start = pos + found;
        let after = html[start + open.len()..].chars().next();
        if matches!(after, Some('>' | '/' | ' ' | '\t' | '\n' | '\r')) {
            return Some(start);
        }
        pos = start + open.len();
    }
    None
}
