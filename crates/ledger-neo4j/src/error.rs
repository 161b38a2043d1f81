use bloomnet_ledger::{LedgerError, LedgerErrorKind};
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested entity was absent.
    #[error("{0} not found")]
    NotFound(String),

    /// The bolt driver failed; treated as the ledger being unreachable.
    #[error("ledger query failed: {0}")]
    Driver(#[from] neo4rs::Error),
}

impl LedgerError for Error {
    fn kind(&self) -> LedgerErrorKind {
        match self {
            Self::NotFound(_) => LedgerErrorKind::NotFound,
            Self::Driver(_) => LedgerErrorKind::Unavailable,
        }
    }
}
