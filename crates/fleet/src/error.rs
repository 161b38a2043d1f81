use bloomnet_ledger::{LedgerError, LedgerErrorKind};
use bloomnet_replication::{CommandError, CommandErrorKind};
use thiserror::Error;

/// Errors surfaced by fleet operations.
///
/// Partial failures of derived projections (target feed, alias
/// resolution) are not errors; they travel as warnings on the outcome
/// structs instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was malformed or insufficient.
    #[error("{0}")]
    InvalidArgument(String),

    /// A strict operation required an entity that is absent.
    #[error("{0}")]
    NotFound(String),

    /// The ledger could not be reached; the caller may retry.
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// The control-plane tool could not be reached; the caller may retry.
    #[error("control plane unavailable: {0}")]
    ControlPlaneUnavailable(String),

    /// The ledger rejected an operation.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// A replication command failed with a non-benign error.
    #[error("replication command failed: {0}")]
    Replication(String),
}

impl Error {
    pub(crate) fn from_ledger<E: LedgerError>(err: E) -> Self {
        match err.kind() {
            LedgerErrorKind::NotFound => Self::NotFound(err.to_string()),
            LedgerErrorKind::Unavailable => Self::LedgerUnavailable(err.to_string()),
            LedgerErrorKind::Other => Self::Ledger(err.to_string()),
        }
    }

    pub(crate) fn from_command<E: CommandError>(err: E) -> Self {
        match err.kind() {
            CommandErrorKind::Unavailable => Self::ControlPlaneUnavailable(err.to_string()),
            _ => Self::Replication(err.to_string()),
        }
    }
}
