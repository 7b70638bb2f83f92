//! CLI error types.

use mdbridge_config::ConfigError;
use mdbridge_publish::PublishError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Validation(String),

    #[error("{failed} of {total} file(s) failed")]
    Failed { failed: usize, total: usize },
}
