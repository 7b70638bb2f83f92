//! `mdbridge jira publish` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use mdbridge_config::{CliSettings, Config};
use mdbridge_markup::parse_time_estimate;
use mdbridge_publish::jira::{
    IssueAction, IssueDefaults, IssueDryRun, IssuePublishResult, IssuePublisher, IssueRequest,
    JiraClient,
};

use crate::commands::for_each_file;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the jira publish command.
#[derive(Args)]
pub(crate) struct PublishArgs {
    /// Markdown files to publish.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Existing issue key to update (e.g. PROJ-123).
    #[arg(long)]
    issue_key: Option<String>,

    /// Parent issue key for creating child issues.
    #[arg(long)]
    parent_key: Option<String>,

    /// Add the content as a comment on --issue-key.
    #[arg(long, requires = "issue_key")]
    as_comment: bool,

    /// Issue type for new issues (overrides config).
    #[arg(long)]
    issue_type: Option<String>,

    /// Priority for new issues (overrides config).
    #[arg(long)]
    priority: Option<String>,

    /// Assignee user name for new issues.
    #[arg(long)]
    assignee: Option<String>,

    /// Time estimate such as 2h, 1d, 30m or 1w (overrides the document).
    #[arg(long)]
    time_estimate: Option<String>,

    /// Phrase marking the estimate footer (overrides config).
    #[arg(long)]
    marker: Option<String>,

    /// Preview without sending anything to Jira.
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

        let cli_settings = CliSettings {
            issue_type: self.issue_type.clone(),
            priority: self.priority.clone(),
            estimate_marker: self.marker.clone(),
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let jira_config = config.require_jira()?;

        let client = JiraClient::from_config(jira_config);
        let publisher = IssuePublisher::new(&client, IssueDefaults::from_config(jira_config));
        let request = self.issue_request(&output);

        for_each_file(&self.files, &output, |path, markdown| {
            output.info(&format!("Converting {}...", path.display()));

            if self.dry_run {
                print_dry_run_result(&output, &publisher.dry_run(markdown, &request));
            } else {
                let result = publisher.publish(markdown, &request)?;
                print_publish_result(&output, &result);
            }
            Ok(())
        })
    }

    fn issue_request(&self, output: &Output) -> IssueRequest {
        let time_estimate = self.time_estimate.as_deref().and_then(|value| {
            let parsed = parse_time_estimate(value);
            if parsed.is_none() {
                output.warning(&format!(
                    "Could not parse time estimate '{value}', using the document estimate"
                ));
            }
            parsed
        });

        IssueRequest {
            issue_key: self.issue_key.clone(),
            parent_key: self.parent_key.clone(),
            assignee: self.assignee.clone(),
            as_comment: self.as_comment,
            time_estimate,
        }
    }
}

fn format_estimate(estimate: Option<Duration>) -> String {
    estimate.map_or_else(|| "none".to_owned(), |d| format!("{}s", d.as_secs()))
}

fn print_dry_run_result(output: &Output, result: &IssueDryRun) {
    output.highlight("\n[DRY RUN] No changes made.");
    output.info(&format!("Action: {}", result.action));
    output.info(&format!("Summary: {}", result.summary));
    output.info(&format!("Estimate: {}", format_estimate(result.estimate)));
    output.info(&format!("\n{}\n", result.body));
    output.warnings(&result.warnings);
}

fn print_publish_result(output: &Output, result: &IssuePublishResult) {
    let headline = match result.action {
        IssueAction::Commented => format!("\nComment added to {}", result.key),
        action => format!("\nIssue {} {action} successfully!", result.key),
    };
    output.success(&headline);
    output.info(&format!("Summary: {}", result.summary));
    if result.action != IssueAction::Commented {
        output.info(&format!("Estimate: {}", format_estimate(result.estimate)));
    }
    output.info(&format!("URL: {}", result.url));
    output.warnings(&result.warnings);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_estimate() {
        assert_eq!(format_estimate(None), "none");
        assert_eq!(format_estimate(Some(Duration::from_secs(7_200))), "7200s");
    }
}
