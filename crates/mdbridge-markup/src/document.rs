//! Source documents with optional YAML front matter.

use serde::Deserialize;
use tracing::warn;

/// Front matter recognized at the top of a source document.
///
/// Unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    /// Title override for the published page or issue.
    #[serde(default)]
    pub title: Option<String>,
}

/// Markdown source split into front matter and body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceDocument {
    pub front_matter: FrontMatter,
    /// Markdown without the front matter block.
    pub body: String,
    /// Problems found while reading the front matter.
    pub warnings: Vec<String>,
}

impl SourceDocument {
    /// Split an optional leading `---` block from the markdown body.
    ///
    /// The block counts as front matter only when it is empty or a YAML mapping;
    /// anything else (a thematic break over a setext heading) stays in the body.
    /// Malformed YAML is reported as a warning and otherwise ignored; the block is
    /// still removed from the body.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let unchanged = || Self {
            body: text.to_owned(),
            ..Self::default()
        };
        let Some((yaml, body)) = split_front_matter(text) else {
            return unchanged();
        };

        let mut warnings = Vec::new();
        let front_matter = if yaml.trim().is_empty() {
            FrontMatter::default()
        } else {
            match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
                Ok(value @ serde_yaml::Value::Mapping(_)) => {
                    serde_yaml::from_value::<FrontMatter>(value).unwrap_or_else(|e| {
                        warn!("Ignoring malformed front matter: {e}");
                        warnings.push(format!("Malformed front matter: {e}"));
                        FrontMatter::default()
                    })
                }
                Ok(_) => return unchanged(),
                Err(e) => {
                    warn!("Ignoring malformed front matter: {e}");
                    warnings.push(format!("Malformed front matter: {e}"));
                    FrontMatter::default()
                }
            }
        };

        Self {
            front_matter,
            body: body.to_owned(),
            warnings,
        }
    }

    /// Title from front matter, if set and non-blank.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.front_matter
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Returns (yaml, body) when the text opens with a closed `---` block.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body.trim_start_matches(['\r', '\n'])));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_front_matter() {
        let doc = SourceDocument::parse("# Title\n\nBody");
        assert_eq!(doc.body, "# Title\n\nBody");
        assert_eq!(doc.title(), None);
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_front_matter_title() {
        let doc = SourceDocument::parse("---\ntitle: Release Notes\nowner: team\n---\n\n# Notes\n");
        assert_eq!(doc.title(), Some("Release Notes"));
        assert_eq!(doc.body, "# Notes\n");
    }

    #[test]
    fn test_front_matter_without_title() {
        let doc = SourceDocument::parse("---\nowner: team\n---\nBody");
        assert_eq!(doc.title(), None);
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_empty_front_matter() {
        let doc = SourceDocument::parse("---\n---\nBody");
        assert_eq!(doc.front_matter, FrontMatter::default());
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_malformed_front_matter_is_ignored() {
        let doc = SourceDocument::parse("---\ntitle: [unclosed\n---\nBody");
        assert_eq!(doc.title(), None);
        assert_eq!(doc.body, "Body");
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let text = "---\ntitle: X\n\nNo closing line";
        let doc = SourceDocument::parse(text);
        assert_eq!(doc.body, text);
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_rule_later_in_document_is_not_front_matter() {
        let text = "Intro\n\n---\n\nMore";
        assert_eq!(SourceDocument::parse(text).body, text);
    }

    #[test]
    fn test_setext_heading_after_rule_is_body() {
        let text = "---\nIntro\n---\n\nBody";
        let doc = SourceDocument::parse(text);
        assert_eq!(doc.body, text);
        assert_eq!(doc.title(), None);
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_wrong_title_type_warns() {
        let doc = SourceDocument::parse("---\ntitle: [a, b]\n---\nBody");
        assert_eq!(doc.title(), None);
        assert_eq!(doc.body, "Body");
        assert_eq!(doc.warnings.len(), 1);
    }

    #[test]
    fn test_crlf_front_matter() {
        let doc = SourceDocument::parse("---\r\ntitle: Win\r\n---\r\nBody");
        assert_eq!(doc.title(), Some("Win"));
        assert_eq!(doc.body, "Body");
    }
}
