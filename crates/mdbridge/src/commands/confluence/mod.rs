//! `mdbridge confluence` subcommand group.

mod publish;

use clap::Subcommand;

use publish::PublishArgs;

use crate::error::CliError;

/// Confluence commands.
#[derive(Subcommand)]
pub(crate) enum ConfluenceCommand {
    /// Create or update Confluence pages from markdown files.
    Publish(PublishArgs),
}

impl ConfluenceCommand {
    /// Execute the confluence subcommand.
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
