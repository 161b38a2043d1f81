//! Topology data model and the abstract interface to the topology ledger.
//!
//! The ledger is the authoritative store for the existence of storage nodes,
//! replication clusters, and the membership edges between them. The alias
//! registry and the monitoring feed are derived projections that track it.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Health standing of a storage node, recomputed on every registration.
///
/// A node is never marked offline outright: a node with any unreachable
/// instance stays visible and addressable as `Degraded`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Both service instances answered their liveness checks.
    Active,

    /// At least one service instance was unreachable.
    Degraded,
}

impl NodeStatus {
    /// Derives a status from the two per-instance probe results.
    #[must_use]
    pub const fn from_probes(instance_a: bool, instance_b: bool) -> Self {
        if instance_a && instance_b {
            Self::Active
        } else {
            Self::Degraded
        }
    }

    /// The ledger representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Degraded => "degraded",
        }
    }
}

impl Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storage node as recorded in the ledger.
///
/// The status is kept as the stored string so records written by other
/// tooling pass through unaltered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Human-assigned unique name, also used as the node's alias label.
    pub name: String,

    /// Unique network address; the true join key for upserts.
    pub ip: String,

    /// Last computed health standing.
    pub status: String,

    /// Milliseconds since the epoch of the last registration, if recorded.
    pub last_seen: Option<i64>,
}

/// A replication cluster together with its materialized member list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Unique cluster name.
    pub name: String,

    /// Milliseconds since the epoch of the first formation, if recorded.
    pub created_at: Option<i64>,

    /// Member nodes, with absent members already filtered out.
    pub members: Vec<NodeRecord>,
}

/// The kind of ledger error, for dispatch without backend knowledge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LedgerErrorKind {
    /// A strict operation required an entity that is absent.
    NotFound,

    /// The ledger could not be reached; the caller may retry.
    Unavailable,

    /// Any other failure.
    Other,
}

/// Marker trait for `TopologyLedger` errors.
pub trait LedgerError: Debug + StdError + Send + Sync {
    /// Returns the kind of this error.
    fn kind(&self) -> LedgerErrorKind;
}

/// Abstract interface to the topology ledger.
///
/// Every operation is a single logical transaction against the backing
/// store: it is either applied or not, so no multi-step rollback exists at
/// this boundary.
#[async_trait]
pub trait TopologyLedger
where
    Self: Clone + Send + Sync + 'static,
{
    /// The error type for this backend.
    type Error: LedgerError;

    /// Creates or updates the node with the given address.
    ///
    /// Keyed by `ip`, not `name`: re-registering an address under a new
    /// name retargets the existing record instead of duplicating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger write fails.
    async fn upsert_node(
        &self,
        name: &str,
        ip: &str,
        status: NodeStatus,
    ) -> Result<(), Self::Error>;

    /// Removes the node with the given name and all its membership edges.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound`-kind error if no node matched.
    async fn delete_node(&self, name: &str) -> Result<(), Self::Error>;

    /// Lists every registered node.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be queried.
    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, Self::Error>;

    /// Lists every cluster with its materialized member list.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be queried.
    async fn list_clusters(&self) -> Result<Vec<ClusterRecord>, Self::Error>;

    /// Creates the cluster if it does not exist yet.
    ///
    /// Idempotent: an existing cluster keeps its original `created_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger write fails.
    async fn ensure_cluster(&self, name: &str) -> Result<(), Self::Error>;

    /// Records a membership edge for every address with a matching node.
    ///
    /// Addresses without a matching node are silently skipped; the caller
    /// is responsible for surfacing the gap, since the ledger cannot know
    /// whether the omission is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger write fails.
    async fn link_members(&self, cluster: &str, ips: &[String]) -> Result<(), Self::Error>;

    /// Returns the member addresses of the given cluster.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound`-kind error if the cluster does not exist; an
    /// existing cluster with no members yields an empty list.
    async fn cluster_member_ips(&self, cluster: &str) -> Result<Vec<String>, Self::Error>;

    /// Removes the cluster and all edges pointing at it.
    ///
    /// Deleting an absent cluster is not an error at this boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger write fails.
    async fn delete_cluster(&self, name: &str) -> Result<(), Self::Error>;
}
