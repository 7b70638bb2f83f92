//! Footnote definitions and reference rewriting.
//!
//! Definitions are read from the markdown source with a line-anchored pattern
//! (`[^label]: text`), not from the rendered HTML. The normalizer leaves
//! references as literal `[^label]` text and renders each definition as its own
//! `<p>[^label]: …</p>` paragraph; emitters strip those paragraphs, rewrite the
//! references and append a target-specific footnote section.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::warn;

static DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\[\^(\w+)\]:[ \t]*(.*?)[ \t]*\r?$").unwrap());

static DEFINITION_PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p>\[\^\w+\]:.*?</p>\n?").unwrap());

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\^(\w+)\]").unwrap());

/// A footnote definition taken from the markdown source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Footnote {
    pub label: String,
    /// First line of the definition, as written.
    pub text: String,
}

impl Footnote {
    /// Anchor name used to link references to the footnote section.
    #[must_use]
    pub fn anchor(&self) -> String {
        format!("footnote-{}", self.label)
    }
}

/// Footnote definitions of one document, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FootnoteTable {
    notes: Vec<Footnote>,
}

impl FootnoteTable {
    /// Collect definitions from markdown. Later duplicates of a label are ignored.
    #[must_use]
    pub fn from_markdown(markdown: &str) -> Self {
        let mut seen = HashSet::new();
        let notes = DEFINITION_RE
            .captures_iter(markdown)
            .filter(|caps| seen.insert(caps[1].to_owned()))
            .map(|caps| Footnote {
                label: caps[1].to_owned(),
                text: caps[2].to_owned(),
            })
            .collect();
        Self { notes }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Footnote> {
        self.notes.iter()
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&Footnote> {
        self.notes.iter().find(|note| note.label == label)
    }

    /// Strip definition paragraphs and rewrite defined references with `reference`.
    ///
    /// References without a definition stay as written and are returned as warnings.
    pub(crate) fn rewrite<F>(&self, html: &str, reference: F) -> (String, Vec<String>)
    where
        F: Fn(&Footnote) -> String,
    {
        let mut warnings = Vec::new();
        if self.is_empty() {
            for label in undefined_labels(html, self) {
                warn!("Footnote reference [^{label}] has no definition");
                warnings.push(format!("Footnote reference [^{label}] has no definition"));
            }
            return (html.to_owned(), warnings);
        }

        let body = DEFINITION_PARAGRAPH_RE.replace_all(html, "");
        let rewritten = REFERENCE_RE.replace_all(&body, |caps: &Captures<'_>| {
            match self.get(&caps[1]) {
                Some(note) => reference(note),
                None => caps[0].to_owned(),
            }
        });

        for label in undefined_labels(&rewritten, self) {
            warn!("Footnote reference [^{label}] has no definition");
            warnings.push(format!("Footnote reference [^{label}] has no definition"));
        }
        (rewritten.into_owned(), warnings)
    }
}

fn undefined_labels(html: &str, table: &FootnoteTable) -> Vec<String> {
    let mut seen = HashSet::new();
    REFERENCE_RE
        .captures_iter(html)
        .map(|caps| caps[1].to_owned())
        .filter(|label| table.get(label).is_none() && seen.insert(label.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_markdown() {
        let table = FootnoteTable::from_markdown(
            "Text[^1] and[^note].\n\n[^1]: First note.\n[^note]:   Second note.  \n",
        );
        let notes: Vec<_> = table.iter().map(|n| (n.label.as_str(), n.text.as_str())).collect();
        assert_eq!(notes, vec![("1", "First note."), ("note", "Second note.")]);
    }

    #[test]
    fn test_definition_must_start_line() {
        let table = FootnoteTable::from_markdown("See [^1]: not a definition");
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_label_keeps_first() {
        let table = FootnoteTable::from_markdown("[^1]: one\n[^1]: two\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("1").map(|n| n.text.as_str()), Some("one"));
    }

    #[test]
    fn test_anchor() {
        let table = FootnoteTable::from_markdown("[^a1]: x");
        assert_eq!(table.get("a1").unwrap().anchor(), "footnote-a1");
    }

    #[test]
    fn test_rewrite() {
        let table = FootnoteTable::from_markdown("Text[^1].\n\n[^1]: The note.");
        let html = "<p>Text[^1].</p>\n<p>[^1]: The note.</p>\n";
        let (result, warnings) = table.rewrite(html, |n| format!("<{}>", n.label));
        assert_eq!(result, "<p>Text<1>.</p>\n");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_rewrite_undefined_reference() {
        let table = FootnoteTable::from_markdown("A[^1] B[^2]\n\n[^1]: One");
        let (result, warnings) = table.rewrite("<p>A[^1] B[^2]</p>", |_| "*".to_owned());
        assert_eq!(result, "<p>A* B[^2]</p>");
        assert_eq!(warnings, vec!["Footnote reference [^2] has no definition"]);
    }

    #[test]
    fn test_rewrite_without_definitions_is_noop() {
        let table = FootnoteTable::default();
        let (result, warnings) = table.rewrite("<p>plain</p>", |_| unreachable!());
        assert_eq!(result, "<p>plain</p>");
        assert!(warnings.is_empty());
    }
}
