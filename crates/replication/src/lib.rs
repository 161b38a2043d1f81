//! Abstract command port for MinIO alias and site-replication administration.
//!
//! The orchestration logic only ever talks to this interface, so it can be
//! exercised against a scripted fake without ever spawning the real
//! configuration tool.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod directory;

pub use directory::AliasDirectory;

use std::error::Error as StdError;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One alias entry as reported by the control-plane registry.
///
/// The URL is passed through verbatim: listings keep malformed entries
/// visible even though resolution drops them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AliasEntry {
    /// The alias name.
    pub alias: String,

    /// The URL the alias points at; may be empty or malformed.
    pub url: String,
}

/// The kind of command error, used to recognize known-benign failures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandErrorKind {
    /// The target is already in the requested configuration.
    AlreadyConfigured,

    /// The target does not exist.
    NotFound,

    /// The control-plane tool could not be run or timed out.
    Unavailable,

    /// Any other failure.
    Other,
}

/// Marker trait for `ReplicationAdmin` errors.
pub trait CommandError: Debug + StdError + Send + Sync {
    /// Returns the kind of this error.
    fn kind(&self) -> CommandErrorKind;
}

/// Abstract interface for administering aliases and site replication.
///
/// The reset and join commands are idempotent; callers decide per
/// operation which error kinds count as success.
#[async_trait]
pub trait ReplicationAdmin
where
    Self: Clone + Send + Sync + 'static,
{
    /// The error type for this backend.
    type Error: CommandError;

    /// Registers or updates a connection alias for a node.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the alias.
    async fn set_alias(
        &self,
        alias: &str,
        url: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<(), Self::Error>;

    /// Removes a connection alias.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound`-kind error if the alias is not configured.
    async fn remove_alias(&self, alias: &str) -> Result<(), Self::Error>;

    /// Lists every alias currently configured.
    ///
    /// Always reflects the registry at call time; implementations must not
    /// cache across calls, since the registry can be mutated out-of-band.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be listed.
    async fn list_aliases(&self) -> Result<Vec<AliasEntry>, Self::Error>;

    /// Clears any replication configuration on the node behind `alias`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; a node that is already clean
    /// commonly fails this, so callers usually ignore the outcome.
    async fn reset_replication(&self, alias: &str) -> Result<(), Self::Error>;

    /// Joins the nodes behind the given aliases into one replication group.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; an `AlreadyConfigured`-kind
    /// failure means the group was formed previously.
    async fn join_replication(&self, aliases: &[String]) -> Result<(), Self::Error>;

    /// Removes every bucket on the node behind `alias`. Destructive.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; a `NotFound`-kind failure
    /// means there was nothing to wipe.
    async fn wipe_buckets(&self, alias: &str) -> Result<(), Self::Error>;
}
