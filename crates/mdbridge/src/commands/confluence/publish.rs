//! `mdbridge confluence publish` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use mdbridge_config::{CliSettings, Config, ConfluenceConfig};
use mdbridge_markup::{SourceDocument, WikiOptions};
use mdbridge_publish::confluence::{
    ConfluenceClient, DryRunResult, PagePublisher, PublishAction, PublishResult,
};

use crate::commands::{for_each_file, title_from_stem};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the confluence publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Markdown files to publish.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Page title (single file only).
    #[arg(short, long)]
    title: Option<String>,

    /// Parent page title (overrides config).
    #[arg(short, long)]
    parent: Option<String>,

    /// Leave `$...$` math as text.
    #[arg(long)]
    no_math: bool,

    /// Preview changes without updating Confluence.
    #[arg(long)]
    dry_run: bool,

    /// Path to configuration file (default: auto-discover mdbridge.toml).
    #[arg(short, long, env = "MDBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl PublishArgs {
    /// Execute the publish command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or any file fails to publish.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        if self.title.is_some() && self.files.len() > 1 {
            return Err(CliError::Validation(
                "--title can only be used with a single file".to_owned(),
            ));
        }

        let cli_settings = CliSettings {
            parent_page: self.parent.clone(),
            math: self.no_math.then_some(false),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let conf_config = config.require_confluence()?;

        let client = ConfluenceClient::from_config(conf_config);
        let publisher = PagePublisher::new(
            &client,
            WikiOptions {
                math: conf_config.math,
            },
        );
        let parent = conf_config.parent_page.as_deref();

        for_each_file(&self.files, &output, |path, markdown| {
            let title = resolve_title(self.title.as_deref(), conf_config, path, markdown);
            output.info(&format!("Converting {} -> \"{title}\"...", path.display()));

            if self.dry_run {
                let result = publisher.dry_run(&title, markdown, parent)?;
                print_dry_run_result(&output, &result);
            } else {
                let result = publisher.publish(&title, markdown, parent)?;
                print_publish_result(&output, &result);
            }
            Ok(())
        })
    }
}

/// Page title: CLI flag, configured rename, front matter, then the file stem.
fn resolve_title(
    cli_title: Option<&str>,
    config: &ConfluenceConfig,
    path: &Path,
    markdown: &str,
) -> String {
    if let Some(title) = cli_title {
        return title.to_owned();
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    if let Some(title) = config.title_for(&file_name) {
        return title.to_owned();
    }

    SourceDocument::parse(markdown)
        .title()
        .map_or_else(|| title_from_stem(path), str::to_owned)
}

fn print_dry_run_result(output: &Output, result: &DryRunResult) {
    output.highlight("\n[DRY RUN] No changes made.");
    output.info(&format!("Title: {}", result.title));

    match (&result.action, &result.existing) {
        (PublishAction::Updated, Some((id, version))) => output.info(&format!(
            "Would update page {id} from version {version} to {}",
            version + 1
        )),
        _ => output.info("Would create a new page"),
    }
    if let Some(parent_id) = &result.parent_id {
        output.info(&format!("Parent page: {parent_id}"));
    }
    output.info(&format!("Body: {} characters", result.markup.len()));
    output.warnings(&result.warnings);
}

fn print_publish_result(output: &Output, result: &PublishResult) {
    output.success(&format!("\nPage {} successfully!", result.action));
    output.info(&format!("ID: {}", result.page_id));
    output.info(&format!("Title: {}", result.title));
    output.info(&format!("Version: {}", result.version));
    output.info(&format!("URL: {}", result.url));
    output.warnings(&result.warnings);
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use pretty_assertions::assert_eq;

    fn config_with_titles(titles: &[(&str, &str)]) -> ConfluenceConfig {
        ConfluenceConfig {
            base_url: "https://acme.atlassian.net/wiki".to_owned(),
            username: "me".to_owned(),
            api_token: "token".to_owned(),
            space_key: "DOCS".to_owned(),
            parent_page: None,
            math: true,
            titles: titles
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_resolve_title_precedence() {
        let config = config_with_titles(&[("README.md", "Project - Overview")]);
        let readme = Path::new("docs/README.md");
        let with_front_matter = "---\ntitle: From Front Matter\n---\n# Heading\n";

        assert_eq!(
            resolve_title(Some("Explicit"), &config, readme, with_front_matter),
            "Explicit"
        );
        assert_eq!(
            resolve_title(None, &config, readme, with_front_matter),
            "Project - Overview"
        );
        assert_eq!(
            resolve_title(None, &config, Path::new("guide.md"), with_front_matter),
            "From Front Matter"
        );
        assert_eq!(
            resolve_title(None, &config, Path::new("user_guide.md"), "# Heading\n"),
            "User Guide"
        );
    }
}
