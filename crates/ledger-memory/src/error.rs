use bloomnet_ledger::{LedgerError, LedgerErrorKind};
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested entity was absent.
    #[error("{0} not found")]
    NotFound(String),
}

impl LedgerError for Error {
    fn kind(&self) -> LedgerErrorKind {
        match self {
            Self::NotFound(_) => LedgerErrorKind::NotFound,
        }
    }
}
