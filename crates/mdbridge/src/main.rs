//! mdbridge CLI - Markdown to Confluence and Jira.
//!
//! Provides commands for:
//! - `convert`: Print a markdown file as Confluence storage format or Jira markup
//! - `confluence publish`: Create or update Confluence pages from markdown
//! - `jira publish`: Create, update or comment on Jira issues from markdown

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfluenceCommand, ConvertArgs, JiraCommand};
use output::Output;

/// mdbridge - Markdown to Confluence and Jira.
#[derive(Parser)]
#[command(name = "mdbridge", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a markdown file and print the result.
    Convert(ConvertArgs),
    /// Confluence publishing commands.
    #[command(subcommand)]
    Confluence(ConfluenceCommand),
    /// Jira publishing commands.
    #[command(subcommand)]
    Jira(JiraCommand),
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Convert(args) => args.verbose,
            Self::Confluence(cmd) => cmd.verbose(),
            Self::Jira(cmd) => cmd.verbose(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Convert(args) => args.execute(),
        Commands::Confluence(cmd) => cmd.execute(),
        Commands::Jira(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
