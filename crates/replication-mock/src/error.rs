use bloomnet_replication::{CommandError, CommandErrorKind};
use thiserror::Error;

/// Scripted error returned by the mock command port.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct Error {
    message: String,
    kind: CommandErrorKind,
}

impl Error {
    /// Creates a new scripted error.
    #[must_use]
    pub fn new(message: impl Into<String>, kind: CommandErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl CommandError for Error {
    fn kind(&self) -> CommandErrorKind {
        self.kind
    }
}
