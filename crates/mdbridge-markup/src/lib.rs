//! Markdown conversion to wiki storage format and issue-tracker markup.
//!
//! Conversion runs in two stages:
//! - [`HtmlNormalizer`]: parses Markdown with pulldown-cmark and renders a fixed,
//!   predictable intermediate HTML (heading ids, fenced code classes, line breaks,
//!   tables, definition lists and optional math placeholders).
//! - An emitter rewrites that HTML into a target grammar:
//!   [`WikiEmitter`] produces Confluence storage format, [`IssueEmitter`] produces
//!   Jira wiki markup.
//!
//! Callout panels and footnotes are special blocks handled by post-processors
//! shared by both emitters. Conversion never fails: unrecognized markup passes
//! through or is stripped.
//!
//! # Example
//!
//! ```
//! use mdbridge_markup::{IssueOptions, WikiOptions, convert_to_issue_markup, convert_to_wiki_markup};
//!
//! let wiki = convert_to_wiki_markup("```python\nprint(1)\n```", &WikiOptions::default());
//! assert!(wiki.markup.contains(r#"<ac:parameter ac:name="language">python</ac:parameter>"#));
//!
//! let issue = convert_to_issue_markup("# My Title\n\n~~gone~~", &IssueOptions::default());
//! assert_eq!(issue.title, "My Title");
//! assert_eq!(issue.body, "-gone-");
//! ```

mod convert;
mod document;
mod footnotes;
pub mod html;
mod issue;
mod normalize;
mod panels;
mod stash;
mod state;
mod util;
mod wiki;

pub use convert::{
    Conversion, IssueConversion, IssueOptions, WikiOptions, convert_to_issue_markup,
    convert_to_wiki_markup,
};
pub use document::{FrontMatter, SourceDocument};
pub use footnotes::{Footnote, FootnoteTable};
pub use issue::IssueEmitter;
pub use issue::metadata::{
    DEFAULT_ESTIMATE_MARKER, EstimateSplit, extract_title, parse_time_estimate,
    split_at_estimate,
};
pub use normalize::{HtmlNormalizer, NormalizeOptions};
pub use panels::{PanelBlock, PanelKind};
pub use wiki::WikiEmitter;
