//! Markdown to intermediate HTML normalizer.
//!
//! Renders pulldown-cmark events into a small, predictable HTML dialect that the
//! emitters rewrite with pattern passes:
//!
//! - Headings carry a slug id: `<h2 id="setup">Setup</h2>`
//! - Fenced code keeps its language: `<pre><code class="language-rust">…</code></pre>`
//! - Bare newlines inside paragraphs become `<br />`
//! - Strikethrough renders as `<del>`
//! - Math (when enabled) renders as `<script type="math/tex">` placeholders, with
//!   `; mode=display` for `$$…$$`
//! - Footnote references stay literal (`[^1]`) and definitions render as
//!   `<p>[^1]: text</p>` so emitters can find and replace them
//!
//! Every block element starts on its own line and ends with a newline.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use tracing::debug;

use crate::state::{CodeBlockState, HeadingState, ImageState, TableState};
use crate::util::heading_level_to_num;

/// Feature flags for the normalizer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalizeOptions {
    /// Recognize `$…$` and `$$…$$` as math.
    pub math: bool,
}

/// Renders markdown into the intermediate HTML consumed by the emitters.
pub struct HtmlNormalizer {
    output: String,
    options: NormalizeOptions,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    /// Inside a footnote definition, paragraph tags are folded into one `<p>`.
    in_footnote_definition: bool,
    in_metadata_block: bool,
}

impl HtmlNormalizer {
    #[must_use]
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            output: String::with_capacity(4096),
            options,
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            pending_image: None,
            in_footnote_definition: false,
            in_metadata_block: false,
        }
    }

    /// Parser options for the fixed extension set.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_DEFINITION_LIST
            | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
        if self.options.math {
            options |= Options::ENABLE_MATH;
        }
        options
    }

    /// Normalize markdown text into intermediate HTML.
    pub fn normalize(mut self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.parser_options());
        for event in parser {
            self.process_event(event);
        }
        let len = self.output.trim_end().len();
        self.output.truncate(len);
        debug!("Normalized {} bytes of markdown into {} bytes of HTML", markdown.len(), len);
        self.output
    }

    fn process_event(&mut self, event: Event<'_>) {
        if self.in_metadata_block && !matches!(event, Event::End(TagEnd::MetadataBlock(_))) {
            return;
        }
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak | Event::HardBreak => self.line_break(),
            Event::Rule => {
                self.block_break();
                self.output.push_str("<hr />\n");
            }
            Event::TaskListMarker(checked) => {
                self.push_inline(if checked { "[x] " } else { "[ ] " });
            }
            Event::FootnoteReference(label) => {
                let reference = format!("[^{label}]");
                self.push_inline(&encode_text(&reference));
            }
            Event::InlineMath(math) => {
                let script = format!(
                    r#"<script type="math/tex">{}</script>"#,
                    encode_text(&math)
                );
                self.push_inline(&script);
            }
            Event::DisplayMath(math) => {
                let script = format!(
                    r#"<script type="math/tex; mode=display">{}</script>"#,
                    encode_text(&math)
                );
                self.push_inline(&script);
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.in_footnote_definition {
                    self.block_break();
                    self.output.push_str("<p>");
                } else if !self.output.ends_with(": ") {
                    self.output.push(' ');
                }
            }
            Tag::Heading { level, .. } => {
                self.block_break();
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => {
                self.block_break();
                self.output.push_str("<blockquote>\n");
            }
            Tag::CodeBlock(kind) => {
                self.block_break();
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
                        .next()
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(start) => {
                self.block_break();
                match start {
                    Some(1) => self.output.push_str("<ol>\n"),
                    Some(n) => writeln!(self.output, r#"<ol start="{n}">"#).unwrap(),
                    None => self.output.push_str("<ul>\n"),
                }
            }
            Tag::Item => {
                self.block_break();
                self.output.push_str("<li>");
            }
            Tag::FootnoteDefinition(label) => {
                self.block_break();
                write!(self.output, "<p>{}: ", encode_text(&format!("[^{label}]"))).unwrap();
                self.in_footnote_definition = true;
            }
            Tag::DefinitionList => {
                self.block_break();
                self.output.push_str("<dl>\n");
            }
            Tag::DefinitionListTitle => {
                self.block_break();
                self.output.push_str("<dt>");
            }
            Tag::DefinitionListDefinition => {
                self.block_break();
                self.output.push_str("<dd>");
            }
            Tag::Table(alignments) => {
                self.block_break();
                self.table.start(alignments);
                self.output.push_str("<table>\n");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead>\n<tr>\n");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>\n");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<del>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let link = if title.is_empty() {
                    format!(r#"<a href="{}">"#, encode_double_quoted_attribute(&dest_url))
                } else {
                    format!(
                        r#"<a href="{}" title="{}">"#,
                        encode_double_quoted_attribute(&dest_url),
                        encode_double_quoted_attribute(&title)
                    )
                };
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::HtmlBlock => self.block_break(),
            Tag::MetadataBlock(_) => self.in_metadata_block = true,
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if !self.in_footnote_definition {
                    self.output.push_str("</p>\n");
                }
            }
            TagEnd::Heading(_) => {
                if let Some((level, id, html)) = self.heading.complete_heading() {
                    writeln!(self.output, r#"<h{level} id="{id}">{}</h{level}>"#, html.trim())
                        .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => {
                self.block_break();
                self.output.push_str("</blockquote>\n");
            }
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                match lang {
                    Some(lang) => writeln!(
                        self.output,
                        r#"<pre><code class="language-{}">{}</code></pre>"#,
                        encode_double_quoted_attribute(&lang),
                        encode_text(&content)
                    ),
                    None => writeln!(self.output, "<pre><code>{}</code></pre>", encode_text(&content)),
                }
                .unwrap();
            }
            TagEnd::List(ordered) => {
                self.block_break();
                self.output
                    .push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
            }
            TagEnd::Item => self.output.push_str("</li>\n"),
            TagEnd::FootnoteDefinition => {
                self.output.push_str("</p>\n");
                self.in_footnote_definition = false;
            }
            TagEnd::DefinitionList => {
                self.block_break();
                self.output.push_str("</dl>\n");
            }
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>\n"),
            TagEnd::DefinitionListDefinition => {
                let len = self.output.trim_end_matches('\n').len();
                self.output.truncate(len);
                self.output.push_str("</dd>\n");
            }
            TagEnd::Table => self.output.push_str("</tbody>\n</table>\n"),
            TagEnd::TableHead => {
                self.output.push_str("</tr>\n</thead>\n<tbody>\n");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>\n"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>\n"
                } else {
                    "</td>\n"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</del>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let mut img = format!(
                        r#"<img alt="{}" src="{}""#,
                        encode_double_quoted_attribute(&alt),
                        encode_double_quoted_attribute(&src)
                    );
                    if !title.is_empty() {
                        write!(img, r#" title="{}""#, encode_double_quoted_attribute(&title))
                            .unwrap();
                    }
                    img.push_str(" />");
                    self.push_inline(&img);
                }
            }
            TagEnd::HtmlBlock => self.block_break(),
            TagEnd::MetadataBlock(_) => self.in_metadata_block = false,
        }
    }

    /// Push inline content to the heading buffer or the output.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&encode_text(text));
        } else {
            self.output.push_str(&encode_text(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!("<code>{}</code>", encode_text(code));
        self.push_inline(&html);
    }

    fn line_break(&mut self) {
        if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.heading.is_active() {
            self.heading.push_text(" ");
            self.heading.push_html(" ");
        } else {
            self.output.push_str("<br />\n");
        }
    }

    /// Start a block element on a fresh line.
    fn block_break(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            self.output.push('\n');
        }
    }
}

impl Default for HtmlNormalizer {
    fn default() -> Self {
        Self::new(NormalizeOptions::default())
    }
}
