//! CLI command implementations.

pub(crate) mod confluence;
pub(crate) mod convert;
pub(crate) mod jira;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub(crate) use confluence::ConfluenceCommand;
pub(crate) use convert::ConvertArgs;
pub(crate) use jira::JiraCommand;

use crate::error::CliError;
use crate::output::Output;

/// Run `publish` for every file, reporting failures and continuing.
///
/// Missing files count as failures. Returns [`CliError::Failed`] when any file failed.
pub(crate) fn for_each_file(
    files: &[PathBuf],
    output: &Output,
    mut publish: impl FnMut(&Path, &str) -> Result<(), CliError>,
) -> Result<(), CliError> {
    let mut failed = 0;

    for path in files {
        if !path.exists() {
            warn!(path = %path.display(), "Skipping missing file");
            output.error(&format!("File not found: {}", path.display()));
            failed += 1;
            continue;
        }

        debug!(path = %path.display(), "Processing file");
        let result = std::fs::read_to_string(path)
            .map_err(CliError::from)
            .and_then(|markdown| publish(path, &markdown));
        if let Err(err) = result {
            debug!(path = %path.display(), error = %err, "File failed");
            output.error(&format!("Error processing {}: {err}", path.display()));
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(CliError::Failed {
            failed,
            total: files.len(),
        });
    }
    Ok(())
}

/// Title from a file stem: `_` and `-` become spaces and each word is capitalized.
pub(crate) fn title_from_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    stem.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_from_stem() {
        assert_eq!(title_from_stem(Path::new("docs/getting_started.md")), "Getting Started");
        assert_eq!(title_from_stem(Path::new("release-notes.md")), "Release Notes");
        assert_eq!(title_from_stem(Path::new("README.md")), "Readme");
        assert_eq!(title_from_stem(Path::new("api__v2.md")), "Api V2");
    }

    #[test]
    fn test_for_each_file_continues_after_failure() {
        let output = Output::new();
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("good.md");
        std::fs::write(&good, "# Good").unwrap();
        let files = vec![dir.path().join("missing.md"), good];

        let mut seen = Vec::new();
        let result = for_each_file(&files, &output, |path, markdown| {
            seen.push((path.to_path_buf(), markdown.to_owned()));
            Ok(())
        });

        assert!(matches!(result, Err(CliError::Failed { failed: 1, total: 2 })));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, "# Good");
    }

    #[test]
    fn test_for_each_file_counts_publish_errors() {
        let output = Output::new();
        let dir = tempfile::TempDir::new().unwrap();
        let files: Vec<PathBuf> = ["a.md", "b.md"].iter().map(|name| dir.path().join(name)).collect();
        for file in &files {
            std::fs::write(file, "Body").unwrap();
        }

        let mut calls = 0;
        let result = for_each_file(&files, &output, |_, _| {
            calls += 1;
            Err(CliError::from(std::io::Error::other("boom")))
        });

        assert!(matches!(result, Err(CliError::Failed { failed: 2, total: 2 })));
        assert_eq!(calls, 2);
    }
}
