//! `mdbridge jira` subcommand group.

mod publish;

use clap::Subcommand;

use publish::PublishArgs;

use crate::error::CliError;

/// Jira commands.
#[derive(Subcommand)]
pub(crate) enum JiraCommand {
    /// Create, update or comment on Jira issues from markdown files.
    Publish(PublishArgs),
}

impl JiraCommand {
    /// Execute the jira subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Publish(args) => args.execute(),
        }
    }

    pub(crate) fn verbose(&self) -> bool {
        match self {
            Self::Publish(args) => args.verbose,
        }
    }
}
