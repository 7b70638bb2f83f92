//! `mdbridge convert` command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use mdbridge_markup::{
    DEFAULT_ESTIMATE_MARKER, IssueOptions, WikiOptions, convert_to_issue_markup,
    convert_to_wiki_markup,
};

use crate::error::CliError;
use crate::output::Output;

/// Markup produced by `convert`.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub(crate) enum Target {
    /// Confluence storage format.
    #[default]
    Wiki,
    /// Jira wiki markup.
    Issue,
}

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Path to the markdown file.
    file: PathBuf,

    /// Output markup.
    #[arg(short, long, value_enum, default_value_t = Target::Wiki)]
    target: Target,

    /// Leave `$...$` math as text.
    #[arg(long)]
    no_math: bool,

    /// Phrase marking the estimate footer (issue target).
    #[arg(long, default_value = DEFAULT_ESTIMATE_MARKER)]
    marker: String,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    /// Execute the convert command.
    ///
    /// The converted markup goes to stdout, everything else to stderr.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let markdown = std::fs::read_to_string(&self.file)?;

        let markup = match self.target {
            Target::Wiki => {
                let conversion =
                    convert_to_wiki_markup(&markdown, &WikiOptions { math: !self.no_math });
                if let Some(title) = &conversion.title {
                    output.info(&format!("Title: {title}"));
                }
                output.warnings(&conversion.warnings);
                conversion.markup
            }
            Target::Issue => {
                let conversion = convert_to_issue_markup(
                    &markdown,
                    &IssueOptions {
                        estimate_marker: self.marker,
                    },
                );
                output.info(&format!("Summary: {}", conversion.title));
                if let Some(estimate) = conversion.estimate {
                    output.info(&format!("Estimate: {}s", estimate.as_secs()));
                }
                output.warnings(&conversion.warnings);
                conversion.body
            }
        };

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{markup}")?;
        stdout.flush()?;
        Ok(())
    }
}
