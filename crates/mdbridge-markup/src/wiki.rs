//! Confluence storage format emitter.
//!
//! Rewrites normalized HTML into storage format. Most elements (paragraphs,
//! emphasis, links, lists, tables) are already valid storage markup and pass
//! through; code, math, callouts, footnotes and images become macros or gain
//! extra markup.

use std::fmt::Write;
use std::sync::LazyLock;

use html_escape::encode_text;
use regex::{Captures, Regex};
use tracing::debug;

use crate::footnotes::FootnoteTable;
use crate::html::{attribute, decode_entities, replace_elements, strip_tags};
use crate::panels::{PanelBlock, replace_panels};
use crate::stash::Stash;

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code(?: class="language-([^"]+)")?>(.*?)</code></pre>"#).unwrap()
});
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<code>.*?</code>").unwrap());
static DISPLAY_MATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script type="math/tex; mode=display">(.*?)</script>"#).unwrap()
});
static INLINE_MATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<script type="math/tex">(.*?)</script>"#).unwrap());
static DOLLAR_MATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([^$\n]+)\$").unwrap());
static HEADING_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<h([1-6]) id="[^"]*">"#).unwrap());
static STRIKE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(del|s)>(.*?)</(?:del|s)>").unwrap());
static STRIKE_TILDE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.+?)~~").unwrap());
static STRIKE_PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[STRIKE\](.*?)\[/STRIKE\]").unwrap());
static DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<dt>(.*?)</dt>|<dd>(.*?)</dd>").unwrap());
static TOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>\s*\[TOC\]\s*</p>").unwrap());
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<img[^>]*>").unwrap());
static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*/?>").unwrap());
static PARAGRAPH_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?p>").unwrap());

/// Emits Confluence storage format from normalized HTML.
#[derive(Clone, Copy, Debug)]
pub struct WikiEmitter {
    math: bool,
}

impl WikiEmitter {
    #[must_use]
    pub fn new(math: bool) -> Self {
        Self { math }
    }

    /// Rewrite normalized HTML into storage format.
    ///
    /// `markdown` is the source the HTML was rendered from; footnote definitions
    /// are read from it. Returns the markup and any warnings.
    #[must_use]
    pub fn emit(&self, html: &str, markdown: &str) -> (String, Vec<String>) {
        let mut stash = Stash::default();
        let mut markup = Stash::sanitize(html);

        markup = convert_code_blocks(&markup, &mut stash);
        markup = INLINE_CODE_RE
            .replace_all(&markup, |caps: &Captures<'_>| stash.put(caps[0].to_owned()))
            .into_owned();
        if self.math {
            markup = convert_math(&markup, &mut stash);
        }
        debug!("Stashed code and math fragments");

        markup = HEADING_ID_RE.replace_all(&markup, "<h$1>").into_owned();

        let footnotes = FootnoteTable::from_markdown(markdown);
        let (with_refs, warnings) = footnotes.rewrite(&markup, |note| {
            format!(
                r##"<sup><a href="#{}">[{}]</a></sup>"##,
                note.anchor(),
                encode_text(&note.label)
            )
        });
        markup = with_refs;
        if !footnotes.is_empty() {
            markup.push_str(&footnote_section(&footnotes));
        }

        markup = STRIKE_TAG_RE
            .replace_all(&markup, "[STRIKE]$2[/STRIKE]")
            .into_owned();
        markup = STRIKE_TILDE_RE
            .replace_all(&markup, "[STRIKE]$1[/STRIKE]")
            .into_owned();

        markup = replace_elements(&markup, "dl", |dl| convert_definition_list(dl.inner));
        markup = replace_panels(&markup, render_panel);
        markup = TOC_RE
            .replace_all(&markup, r#"<ac:structured-macro ac:name="toc" />"#)
            .into_owned();
        markup = IMAGE_RE
            .replace_all(&markup, |caps: &Captures<'_>| image_with_caption(&caps[0]))
            .into_owned();
        markup = BR_RE.replace_all(&markup, "<br/>").into_owned();
        markup = STRIKE_PLACEHOLDER_RE
            .replace_all(
                &markup,
                r#"<span style="text-decoration: line-through;">$1</span>"#,
            )
            .into_owned();

        debug!("Emitted {} bytes of storage format", markup.len());
        (stash.restore(&markup), warnings)
    }
}

impl Default for WikiEmitter {
    fn default() -> Self {
        Self::new(true)
    }
}

fn convert_code_blocks(html: &str, stash: &mut Stash) -> String {
    CODE_BLOCK_RE
        .replace_all(html, |caps: &Captures<'_>| {
            let code = decode_entities(&strip_tags(&caps[2])).trim().to_owned();
            let mut macro_xml = String::from(r#"<ac:structured-macro ac:name="code">"#);
            if let Some(lang) = caps.get(1) {
                write!(
                    macro_xml,
                    r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
                    lang.as_str()
                )
                .unwrap();
            }
            write!(
                macro_xml,
                "<ac:plain-text-body>{}</ac:plain-text-body></ac:structured-macro>",
                cdata(&code)
            )
            .unwrap();
            stash.put(macro_xml)
        })
        .into_owned()
}

fn convert_math(html: &str, stash: &mut Stash) -> String {
    let html = DISPLAY_MATH_RE.replace_all(html, |caps: &Captures<'_>| {
        stash.put(math_macro(&decode_entities(&caps[1]), true))
    });
    let html = INLINE_MATH_RE.replace_all(&html, |caps: &Captures<'_>| {
        stash.put(math_macro(&decode_entities(&caps[1]), false))
    });
    DOLLAR_MATH_RE
        .replace_all(&html, |caps: &Captures<'_>| {
            stash.put(math_macro(&decode_entities(&caps[1]), false))
        })
        .into_owned()
}

fn math_macro(expression: &str, display: bool) -> String {
    let display_param = if display {
        r#"<ac:parameter ac:name="display">block</ac:parameter>"#
    } else {
        ""
    };
    format!(
        r#"<ac:structured-macro ac:name="math">{display_param}<ac:plain-text-body>{}</ac:plain-text-body></ac:structured-macro>"#,
        cdata(expression.trim())
    )
}

/// Wrap text in CDATA, splitting any `]]>` it contains.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn footnote_section(footnotes: &FootnoteTable) -> String {
    let mut section = String::from("\n<hr/><h3>Footnotes</h3>\n");
    for note in footnotes.iter() {
        writeln!(
            section,
            r#"<p><ac:structured-macro ac:name="anchor"><ac:parameter ac:name="">{}</ac:parameter></ac:structured-macro>[{}] {}</p>"#,
            note.anchor(),
            encode_text(&note.label),
            encode_text(&note.text)
        )
        .unwrap();
    }
    section
}

/// `<dt>Term</dt><dd>Definition</dd>` becomes `<p><strong>Term:</strong> Definition</p>`.
fn convert_definition_list(inner: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut term: Option<String> = None;

    for caps in DEFINITION_RE.captures_iter(inner) {
        if let Some(dt) = caps.get(1) {
            if let Some(previous) = term.replace(dt.as_str().trim().to_owned()) {
                paragraphs.push(format!("<p><strong>{previous}</strong></p>"));
            }
        } else if let Some(dd) = caps.get(2) {
            let definition = PARAGRAPH_TAG_RE.replace_all(dd.as_str(), " ");
            let definition = definition.trim();
            match term.take() {
                Some(term) => paragraphs.push(format!("<p><strong>{term}:</strong> {definition}</p>")),
                None => paragraphs.push(format!("<p>{definition}</p>")),
            }
        }
    }
    if let Some(term) = term {
        paragraphs.push(format!("<p><strong>{term}</strong></p>"));
    }

    paragraphs.join("\n")
}

fn render_panel(panel: &PanelBlock) -> String {
    let mut body = String::new();
    for paragraph in &panel.paragraphs {
        if PanelBlock::is_block_fragment(paragraph) {
            body.push_str(paragraph);
        } else {
            write!(body, "<p>{paragraph}</p>").unwrap();
        }
    }
    format!(
        r#"<ac:structured-macro ac:name="{}" ac:schema-version="1"><ac:parameter ac:name="title">{}</ac:parameter><ac:rich-text-body>{body}</ac:rich-text-body></ac:structured-macro>"#,
        panel.kind.macro_name(),
        panel.kind.title()
    )
}

fn image_with_caption(img_tag: &str) -> String {
    let src = attribute(img_tag, "src").unwrap_or_default();
    let title = attribute(img_tag, "title").unwrap_or_default();
    let file_name = src.rsplit('/').next().unwrap_or_default();
    format!(
        "{img_tag}<br/>[IMAGE] {} | {} [/IMAGE]",
        encode_text(file_name),
        encode_text(&title)
    )
}
