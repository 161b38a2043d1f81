//! In-memory implementation of the topology ledger for tests and local runs.
//!
//! Observable semantics match the Neo4j backend: upserts are keyed by ip,
//! `created_at` survives re-formation, and strict deletes report absence.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bloomnet_ledger::{ClusterRecord, NodeRecord, NodeStatus, TopologyLedger};
use tokio::sync::RwLock;

#[derive(Clone, Debug)]
struct StoredNode {
    name: String,
    status: NodeStatus,
    last_seen: i64,
}

#[derive(Clone, Debug)]
struct StoredCluster {
    created_at: i64,
    member_ips: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct State {
    // keyed by ip, the true join key
    nodes: BTreeMap<String, StoredNode>,
    clusters: BTreeMap<String, StoredCluster>,
}

/// In-memory topology ledger.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<RwLock<State>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

fn record_for(ip: &str, node: &StoredNode) -> NodeRecord {
    NodeRecord {
        name: node.name.clone(),
        ip: ip.to_owned(),
        status: node.status.as_str().to_owned(),
        last_seen: Some(node.last_seen),
    }
}

#[async_trait]
impl TopologyLedger for MemoryLedger {
    type Error = Error;

    async fn upsert_node(&self, name: &str, ip: &str, status: NodeStatus) -> Result<(), Error> {
        let mut state = self.inner.write().await;

        state.nodes.insert(
            ip.to_owned(),
            StoredNode {
                name: name.to_owned(),
                status,
                last_seen: now_ms(),
            },
        );

        Ok(())
    }

    async fn delete_node(&self, name: &str) -> Result<(), Error> {
        let mut state = self.inner.write().await;

        let ips: Vec<String> = state
            .nodes
            .iter()
            .filter(|(_, node)| node.name == name)
            .map(|(ip, _)| ip.clone())
            .collect();

        if ips.is_empty() {
            return Err(Error::NotFound(format!("node '{name}'")));
        }

        for ip in &ips {
            state.nodes.remove(ip);
            // detach: drop membership edges along with the node
            for cluster in state.clusters.values_mut() {
                cluster.member_ips.remove(ip);
            }
        }

        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, Error> {
        let state = self.inner.read().await;

        Ok(state
            .nodes
            .iter()
            .map(|(ip, node)| record_for(ip, node))
            .collect())
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterRecord>, Error> {
        let state = self.inner.read().await;

        Ok(state
            .clusters
            .iter()
            .map(|(name, cluster)| ClusterRecord {
                name: name.clone(),
                created_at: Some(cluster.created_at),
                members: cluster
                    .member_ips
                    .iter()
                    .filter_map(|ip| state.nodes.get(ip).map(|node| record_for(ip, node)))
                    .collect(),
            })
            .collect())
    }

    async fn ensure_cluster(&self, name: &str) -> Result<(), Error> {
        let mut state = self.inner.write().await;

        state
            .clusters
            .entry(name.to_owned())
            .or_insert_with(|| StoredCluster {
                created_at: now_ms(),
                member_ips: BTreeSet::new(),
            });

        Ok(())
    }

    async fn link_members(&self, cluster: &str, ips: &[String]) -> Result<(), Error> {
        let mut state = self.inner.write().await;

        let known: Vec<String> = ips
            .iter()
            .filter(|ip| state.nodes.contains_key(*ip))
            .cloned()
            .collect();

        if let Some(stored) = state.clusters.get_mut(cluster) {
            stored.member_ips.extend(known);
        }

        Ok(())
    }

    async fn cluster_member_ips(&self, cluster: &str) -> Result<Vec<String>, Error> {
        let state = self.inner.read().await;

        state.clusters.get(cluster).map_or_else(
            || Err(Error::NotFound(format!("cluster '{cluster}'"))),
            |stored| Ok(stored.member_ips.iter().cloned().collect()),
        )
    }

    async fn delete_cluster(&self, name: &str) -> Result<(), Error> {
        let mut state = self.inner.write().await;

        state.clusters.remove(name);

        Ok(())
    }
}
