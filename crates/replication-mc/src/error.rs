use std::time::Duration;

use bloomnet_replication::{CommandError, CommandErrorKind};
use thiserror::Error;

/// Errors that can occur when driving the `mc` CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// The binary could not be spawned.
    #[error("failed to spawn '{0}': {1}")]
    Spawn(String, #[source] std::io::Error),

    /// The command did not finish within its timeout.
    #[error("'{1}' timed out after {0:?}")]
    Timeout(Duration, String),

    /// The command exited nonzero.
    #[error("'{command}' failed: {stderr}")]
    Command {
        /// The command line that failed.
        command: String,

        /// Captured standard error output.
        stderr: String,
    },
}

impl CommandError for Error {
    fn kind(&self) -> CommandErrorKind {
        match self {
            Self::Spawn(..) | Self::Timeout(..) => CommandErrorKind::Unavailable,
            Self::Command { stderr, .. } => {
                let stderr = stderr.to_lowercase();
                if stderr.contains("already") {
                    CommandErrorKind::AlreadyConfigured
                } else if stderr.contains("does not exist") {
                    CommandErrorKind::NotFound
                } else {
                    CommandErrorKind::Other
                }
            }
        }
    }
}
