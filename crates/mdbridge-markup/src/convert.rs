//! Markdown conversion entry points.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::document::SourceDocument;
use crate::issue::IssueEmitter;
use crate::issue::metadata::{DEFAULT_ESTIMATE_MARKER, extract_title, split_at_estimate};
use crate::normalize::{HtmlNormalizer, NormalizeOptions};
use crate::wiki::WikiEmitter;

static ATX_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}(?:\s|$)").unwrap());

/// Options for wiki storage format conversion.
#[derive(Clone, Copy, Debug)]
pub struct WikiOptions {
    /// Convert `$…$` and `$$…$$` into math macros.
    pub math: bool,
}

impl Default for WikiOptions {
    fn default() -> Self {
        Self { math: true }
    }
}

/// Options for issue markup conversion.
#[derive(Clone, Debug)]
pub struct IssueOptions {
    /// Phrase marking the estimate footer; content from that line on is dropped.
    pub estimate_marker: String,
}

impl Default for IssueOptions {
    fn default() -> Self {
        Self {
            estimate_marker: DEFAULT_ESTIMATE_MARKER.to_owned(),
        }
    }
}

/// Result of converting a document to wiki storage format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversion {
    pub markup: String,
    /// Title from front matter, if any.
    pub title: Option<String>,
    pub warnings: Vec<String>,
}

/// Result of converting a document to issue markup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssueConversion {
    /// Issue description.
    pub body: String,
    /// Issue summary: front-matter title, else the first source line.
    pub title: String,
    /// Estimate parsed from the marker line.
    pub estimate: Option<Duration>,
    pub warnings: Vec<String>,
}

/// Convert markdown to Confluence storage format.
#[must_use]
pub fn convert_to_wiki_markup(markdown: &str, options: &WikiOptions) -> Conversion {
    let document = SourceDocument::parse(markdown);
    let html = HtmlNormalizer::new(NormalizeOptions {
        math: options.math,
    })
    .normalize(&document.body);
    let (markup, emit_warnings) = WikiEmitter::new(options.math).emit(&html, &document.body);

    let title = document.title().map(str::to_owned);
    let mut warnings = document.warnings;
    warnings.extend(emit_warnings);
    debug!("Converted document to storage format with {} warning(s)", warnings.len());

    Conversion {
        markup,
        title,
        warnings,
    }
}

/// Convert markdown to Jira wiki markup.
///
/// The estimate footer (from the marker line on) is cut before conversion and a
/// leading ATX heading is used as the summary rather than the body.
#[must_use]
pub fn convert_to_issue_markup(markdown: &str, options: &IssueOptions) -> IssueConversion {
    let document = SourceDocument::parse(markdown);
    let title = document
        .title()
        .map_or_else(|| extract_title(&document.body), str::to_owned);

    let split = split_at_estimate(&document.body, &options.estimate_marker);
    let content = without_title_line(&split.content);
    let html = HtmlNormalizer::new(NormalizeOptions { math: false }).normalize(content);
    let (body, emit_warnings) = IssueEmitter::new().emit(&html, content);

    let mut warnings = document.warnings;
    warnings.extend(emit_warnings);
    if split.marker_found && split.days.is_none() {
        warnings.push(format!(
            "No day count found on the '{}' line",
            options.estimate_marker
        ));
    }
    debug!("Converted document to issue markup with {} warning(s)", warnings.len());

    IssueConversion {
        body,
        title,
        estimate: split.duration(),
        warnings,
    }
}

/// Drop the first line when it is an ATX heading.
fn without_title_line(markdown: &str) -> &str {
    let first = markdown.lines().next().unwrap_or_default();
    if !ATX_HEADING_RE.is_match(first) {
        return markdown;
    }
    markdown
        .split_once('\n')
        .map_or("", |(_, rest)| rest)
}
