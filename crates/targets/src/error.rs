use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// The collection could not be serialized.
    #[error("failed to serialize target collection: {0}")]
    Serialize(#[from] serde_json::Error),
}
