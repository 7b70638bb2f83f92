//! Jira wiki markup emitter.
//!
//! Unlike storage format, issue markup is plain text: every construct is turned
//! into its text syntax and whatever HTML is left at the end is stripped.
//! Nested lists cannot be expressed and are flattened into their parent item.

pub(crate) mod metadata;

use std::fmt::Write;
use std::sync::LazyLock;

use html_escape::encode_text;
use regex::{Captures, Regex};
use tracing::debug;

use crate::footnotes::FootnoteTable;
use crate::html::{
    Element, attribute, decode_entities, elements, list_items, replace_elements, strip_tags,
    table_rows,
};
use crate::panels::{PanelBlock, replace_panels};
use crate::stash::Stash;

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code(?: class="language-([^"]+)")?>(.*?)</code></pre>"#).unwrap()
});
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<code>(.*?)</code>").unwrap());
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<h([1-6])(?: id="[^"]*")?>(.*?)</h[1-6]>"#).unwrap());
static STRONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<strong>(.*?)</strong>").unwrap());
static EM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<em>(.*?)</em>").unwrap());
static STRIKE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(del|s)>(.*?)</(?:del|s)>").unwrap());
static STRIKE_TILDE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.+?)~~").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a href="([^"]*)"(?: title="[^"]*")?>(.*?)</a>"#).unwrap()
});
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<img[^>]*>").unwrap());
static DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<dt>(.*?)</dt>|<dd>(.*?)</dd>").unwrap());
static TOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>\s*\[TOC\]\s*</p>").unwrap());
static PARAGRAPH_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<p>").unwrap());
static PARAGRAPH_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</p>").unwrap());
static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*/?>\n?").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());
static NEWLINE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static HEADER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^h[1-6]\.\s").unwrap());

/// Emits Jira wiki markup from normalized HTML.
#[derive(Clone, Copy, Debug, Default)]
pub struct IssueEmitter;

impl IssueEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rewrite normalized HTML into issue markup.
    ///
    /// `markdown` is the source the HTML was rendered from; footnote definitions
    /// are read from it. Returns the markup and any warnings.
    #[must_use]
    pub fn emit(&self, html: &str, markdown: &str) -> (String, Vec<String>) {
        let mut stash = Stash::default();
        let mut markup = Stash::sanitize(html);

        markup = CODE_BLOCK_RE
            .replace_all(&markup, |caps: &Captures<'_>| {
                let code = decode_entities(&strip_tags(&caps[2])).trim().to_owned();
                let open = match caps.get(1) {
                    Some(lang) => format!("{{code:{}}}", lang.as_str()),
                    None => "{code}".to_owned(),
                };
                stash.put(format!("{open}\n{code}\n{{code}}"))
            })
            .into_owned();
        markup = INLINE_CODE_RE
            .replace_all(&markup, |caps: &Captures<'_>| {
                stash.put(format!("{{{{{}}}}}", decode_entities(&caps[1])))
            })
            .into_owned();
        debug!("Stashed code fragments");

        markup = replace_panels(&markup, render_panel);
        markup = HEADING_RE
            .replace_all(&markup, |caps: &Captures<'_>| {
                format!("\nh{}. {}\n", &caps[1], caps[2].trim())
            })
            .into_owned();

        markup = STRONG_RE.replace_all(&markup, "*$1*").into_owned();
        markup = EM_RE.replace_all(&markup, "_${1}_").into_owned();
        markup = STRIKE_TAG_RE.replace_all(&markup, "-$2-").into_owned();
        markup = LINK_RE.replace_all(&markup, "[$2|$1]").into_owned();
        markup = IMAGE_RE
            .replace_all(&markup, |caps: &Captures<'_>| image(&caps[0]))
            .into_owned();

        markup = replace_elements(&markup, "dl", |dl| convert_definition_list(dl.inner));
        markup = convert_lists(&markup);
        markup = replace_elements(&markup, "table", |table| convert_table(table.inner));
        markup = replace_elements(&markup, "blockquote", |quote| convert_blockquote(quote.inner));
        markup = TOC_RE.replace_all(&markup, "{toc}").into_owned();

        let footnotes = FootnoteTable::from_markdown(markdown);
        let (with_refs, warnings) =
            footnotes.rewrite(&markup, |note| format!("^[{}]^", note.label));
        markup = with_refs;
        if !footnotes.is_empty() {
            markup.push_str(&footnote_section(&footnotes));
        }

        markup = PARAGRAPH_OPEN_RE.replace_all(&markup, "").into_owned();
        markup = PARAGRAPH_CLOSE_RE.replace_all(&markup, "\n").into_owned();
        markup = BR_RE.replace_all(&markup, "\n").into_owned();
        markup = STRIKE_TILDE_RE.replace_all(&markup, "-$1-").into_owned();

        markup = decode_entities(&strip_tags(&markup)).into_owned();
        markup = cleanup(&markup);

        debug!("Emitted {} bytes of issue markup", markup.len());
        (stash.restore(&markup), warnings)
    }
}

fn render_panel(panel: &PanelBlock) -> String {
    let name = panel.kind.macro_name();
    format!("\n{{{name}}}\n{}\n{{{name}}}\n", panel.paragraphs.join("\n\n"))
}

fn image(img_tag: &str) -> String {
    let src = attribute(img_tag, "src").unwrap_or_default();
    match attribute(img_tag, "title").filter(|t| !t.is_empty()) {
        Some(title) => format!("!{}|title={}!", encode_text(&src), encode_text(&title)),
        None => format!("!{}!", encode_text(&src)),
    }
}

/// `<dt>Term</dt><dd>Definition</dd>` becomes `*Term:* Definition`.
fn convert_definition_list(inner: &str) -> String {
    let mut lines = Vec::new();
    let mut term: Option<String> = None;

    for caps in DEFINITION_RE.captures_iter(inner) {
        if let Some(dt) = caps.get(1) {
            if let Some(previous) = term.replace(flatten(dt.as_str())) {
                lines.push(format!("*{previous}*"));
            }
        } else if let Some(dd) = caps.get(2) {
            let definition = flatten(dd.as_str());
            match term.take() {
                Some(term) => lines.push(format!("*{term}:* {definition}")),
                None => lines.push(definition),
            }
        }
    }
    if let Some(term) = term {
        lines.push(format!("*{term}*"));
    }

    format!("\n{}\n", lines.join("\n"))
}

/// Replace outermost lists, `<ul>` and `<ol>` alike, in document order.
fn convert_lists(html: &str) -> String {
    let mut lists: Vec<(Element<'_>, &str)> = elements(html, "ul")
        .into_iter()
        .map(|e| (e, "*"))
        .chain(elements(html, "ol").into_iter().map(|e| (e, "#")))
        .collect();
    lists.sort_by_key(|(e, _)| e.start);

    let mut result = String::with_capacity(html.len());
    let mut last = 0;
    for (list, marker) in &lists {
        // Lists nested inside an already converted list were flattened with it.
        if list.start < last {
            continue;
        }
        result.push_str(&html[last..list.start]);
        let lines: Vec<String> = list_items(list.inner)
            .into_iter()
            .map(|item| format!("{marker} {}", flatten(item)))
            .collect();
        write!(result, "\n{}\n", lines.join("\n")).unwrap();
        last = list.end;
    }
    result.push_str(&html[last..]);
    result
}

fn convert_table(inner: &str) -> String {
    let rows: Vec<String> = table_rows(inner)
        .into_iter()
        .filter(|cells| !cells.is_empty())
        .map(|cells| format!("||{}||", cells.join("||")))
        .collect();
    format!("\n{}\n", rows.join("\n"))
}

fn convert_blockquote(inner: &str) -> String {
    let text = BR_RE.replace_all(inner, "\n");
    let text = PARAGRAPH_CLOSE_RE.replace_all(&text, "\n");
    let text = strip_tags(&text);
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("bq. {line}"))
        .collect();
    format!("\n{}\n", lines.join("\n"))
}

fn footnote_section(footnotes: &FootnoteTable) -> String {
    let mut section = String::from("\n----\nh3. Footnotes\n");
    for note in footnotes.iter() {
        writeln!(section, "[{}] {}", note.label, encode_text(&note.text)).unwrap();
    }
    section
}

/// Tag-stripped text with all whitespace runs collapsed to single spaces.
fn flatten(fragment: &str) -> String {
    WHITESPACE_RE
        .replace_all(strip_tags(fragment).trim(), " ")
        .into_owned()
}

fn cleanup(markup: &str) -> String {
    let collapsed = BLANK_RUN_RE.replace_all(markup, "\n\n");
    let spaced = add_header_spacing(collapsed.trim());
    NEWLINE_RUN_RE.replace_all(&spaced, "\n\n").trim().to_owned()
}

/// Isolate heading lines with blank lines; the first line only gets one after it.
fn add_header_spacing(markup: &str) -> String {
    let mut lines = Vec::new();
    for (i, line) in markup.split('\n').enumerate() {
        if HEADER_LINE_RE.is_match(line) {
            if i > 0 {
                lines.push("");
            }
            lines.push(line);
            lines.push("");
        } else {
            lines.push(line);
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn emit(html: &str) -> String {
        IssueEmitter::new().emit(html, "").0
    }

    #[test]
    fn test_code_block_with_language() {
        assert_eq!(
            emit("<pre><code class=\"language-python\">print(1)\n</code></pre>"),
            "{code:python}\nprint(1)\n{code}"
        );
    }

    #[test]
    fn test_code_block_without_language_decodes_entities() {
        assert_eq!(
            emit("<pre><code>if a &lt; b {\n    *x* = 1;\n}\n</code></pre>"),
            "{code}\nif a < b {\n    *x* = 1;\n}\n{code}"
        );
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(emit("<p>Run <code>a &amp;&amp; b</code></p>"), "Run {{a && b}}");
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            emit("<h1 id=\"t\">Title</h1>\n<p>Intro</p>\n<h2 id=\"s\">Section</h2>\n<p>Body</p>"),
            "h1. Title\n\nIntro\n\nh2. Section\n\nBody"
        );
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            emit("<p><strong>bold</strong> <em>it</em> <del>gone</del> ~~old~~</p>"),
            "*bold* _it_ -gone- -old-"
        );
    }

    #[test]
    fn test_link() {
        assert_eq!(
            emit(r#"<p><a href="https://example.com/?a=1&amp;b=2" title="T">site</a></p>"#),
            "[site|https://example.com/?a=1&b=2]"
        );
    }

    #[test]
    fn test_images() {
        assert_eq!(emit(r#"<p><img alt="x" src="a/pic.png" /></p>"#), "!a/pic.png!");
        assert_eq!(
            emit(r#"<p><img alt="x" src="pic.png" title="Cap" /></p>"#),
            "!pic.png|title=Cap!"
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            emit("<ul>\n<li>one</li>\n<li><strong>two</strong></li>\n</ul>\n<ol>\n<li>first</li>\n</ol>"),
            "* one\n* *two*\n\n# first"
        );
    }

    #[test]
    fn test_nested_list_is_flattened() {
        assert_eq!(
            emit("<ol>\n<li>parent\n<ul>\n<li>child</li>\n</ul>\n</li>\n<li>next</li>\n</ol>"),
            "# parent child\n# next"
        );
    }

    #[test]
    fn test_loose_list_items() {
        assert_eq!(
            emit("<ul>\n<li>\n<p>one</p>\n</li>\n<li>\n<p>two</p>\n</li>\n</ul>"),
            "* one\n* two"
        );
    }

    #[test]
    fn test_table_rows_all_use_double_pipes() {
        let html = concat!(
            "<table>\n<thead>\n<tr>\n<th>A</th>\n<th>B</th>\n</tr>\n</thead>\n",
            "<tbody>\n<tr>\n<td>1 &lt; 2</td>\n<td><em>x</em></td>\n</tr>\n</tbody>\n</table>"
        );
        assert_eq!(emit(html), "||A||B||\n||1 < 2||_x_||");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            emit("<blockquote>\n<p>First<br />\nsecond</p>\n<p>Third</p>\n</blockquote>"),
            "bq. First\nbq. second\nbq. Third"
        );
    }

    #[test]
    fn test_panels() {
        assert_eq!(
            emit("<blockquote>\n<p>Info: Read <strong>this</strong>.</p>\n<p>More.</p>\n</blockquote>"),
            "{info}\nRead *this*.\n\nMore.\n{info}"
        );
        assert_eq!(
            emit("<blockquote>\n<p><strong>Warning:</strong> Careful</p>\n</blockquote>"),
            "{note}\nCareful\n{note}"
        );
        assert_eq!(
            emit("<blockquote>\n<p>error: Broken</p>\n</blockquote>"),
            "{warning}\nBroken\n{warning}"
        );
    }

    #[test]
    fn test_definition_list() {
        assert_eq!(
            emit("<dl>\n<dt>Term</dt>\n<dd>Definition</dd>\n</dl>"),
            "*Term:* Definition"
        );
    }

    #[test]
    fn test_toc_marker() {
        assert_eq!(emit("<p>[TOC]</p>\n<p>Body</p>"), "{toc}\nBody");
    }

    #[test]
    fn test_footnotes() {
        let markdown = "Text[^1].\n\n[^1]: The note.";
        let html = "<p>Text[^1].</p>\n<p>[^1]: The note.</p>";
        let (markup, warnings) = IssueEmitter::new().emit(html, markdown);
        assert_eq!(markup, "Text^[1]^.\n\n----\n\nh3. Footnotes\n\n[1] The note.");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_no_footnote_section_without_definitions() {
        assert!(!emit("<p>Plain</p>").contains("Footnotes"));
    }

    #[test]
    fn test_entities_decoded_and_tags_stripped() {
        assert_eq!(
            emit("<p>Tom &amp; Jerry <span>say</span> &quot;hi&quot;</p>"),
            "Tom & Jerry say \"hi\""
        );
    }

    #[test]
    fn test_blank_lines_collapsed() {
        assert_eq!(emit("<p>a</p>\n\n\n\n<p>b</p>\n\n\n"), "a\n\nb");
    }

    #[test]
    fn test_header_spacing() {
        assert_eq!(add_header_spacing("h1. A\ntext\nh2. B\nmore"), "h1. A\n\ntext\n\nh2. B\n\nmore");
    }
}
