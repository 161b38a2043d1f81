//! Neo4j-backed implementation of the topology ledger.
//!
//! Every operation is a single parameterized Cypher round trip over a
//! pooled bolt connection. Nodes are `MinioNode` entities keyed by `ip`,
//! clusters are `MinioCluster` entities keyed by `name`, and membership is
//! a directed `MEMBER_OF` edge from node to cluster.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::BTreeMap;

use async_trait::async_trait;
use bloomnet_ledger::{ClusterRecord, NodeRecord, NodeStatus, TopologyLedger};
use neo4rs::{Graph, query};
use tracing::debug;

/// Options for connecting to the Neo4j ledger.
pub struct Neo4jLedgerOptions {
    /// Bolt URI of the server, e.g. `bolt://localhost:7687`.
    pub uri: String,

    /// Username to authenticate with.
    pub user: String,

    /// Password to authenticate with.
    pub password: String,
}

/// Neo4j-backed topology ledger.
#[derive(Clone)]
pub struct Neo4jLedger {
    graph: Graph,
}

impl Neo4jLedger {
    /// Connects to the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the bolt connection cannot be established or
    /// authentication fails.
    pub async fn connect(
        Neo4jLedgerOptions {
            uri,
            user,
            password,
        }: Neo4jLedgerOptions,
    ) -> Result<Self, Error> {
        let graph = Graph::new(&uri, &user, &password).await?;

        Ok(Self { graph })
    }
}

#[async_trait]
impl TopologyLedger for Neo4jLedger {
    type Error = Error;

    async fn upsert_node(&self, name: &str, ip: &str, status: NodeStatus) -> Result<(), Error> {
        let q = query(
            "MERGE (n:MinioNode {ip: $ip}) \
             SET n.name = $name, n.status = $status, n.last_seen = timestamp()",
        )
        .param("ip", ip)
        .param("name", name)
        .param("status", status.as_str());

        self.graph.run(q).await?;

        Ok(())
    }

    async fn delete_node(&self, name: &str) -> Result<(), Error> {
        let q = query(
            "MATCH (n:MinioNode {name: $name}) \
             DETACH DELETE n \
             RETURN count(n) AS deleted",
        )
        .param("name", name);

        let mut rows = self.graph.execute(q).await?;
        let deleted = match rows.next().await? {
            Some(row) => row.get::<i64>("deleted").unwrap_or(0),
            None => 0,
        };

        if deleted == 0 {
            return Err(Error::NotFound(format!("node '{name}'")));
        }

        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, Error> {
        let q = query(
            "MATCH (n:MinioNode) \
             RETURN n.name AS name, n.ip AS ip, n.status AS status, n.last_seen AS last_seen \
             ORDER BY n.name",
        );

        let mut rows = self.graph.execute(q).await?;
        let mut nodes = Vec::new();

        while let Some(row) = rows.next().await? {
            // A node without an ip is unusable as a fleet member; skip it.
            let Ok(ip) = row.get::<String>("ip") else {
                debug!("skipping ledger node without an ip");
                continue;
            };

            nodes.push(NodeRecord {
                name: row.get::<String>("name").unwrap_or_default(),
                ip,
                status: row.get::<String>("status").unwrap_or_default(),
                last_seen: row.get::<i64>("last_seen").ok(),
            });
        }

        Ok(nodes)
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterRecord>, Error> {
        // One row per (cluster, member) pair; clusters without members come
        // back as a single row with null member fields.
        let q = query(
            "MATCH (c:MinioCluster) \
             OPTIONAL MATCH (m:MinioNode)-[:MEMBER_OF]->(c) \
             RETURN c.name AS cluster, c.created_at AS created_at, \
                    m.name AS member_name, m.ip AS member_ip, \
                    m.status AS member_status, m.last_seen AS member_last_seen",
        );

        let mut rows = self.graph.execute(q).await?;
        let mut clusters: BTreeMap<String, ClusterRecord> = BTreeMap::new();

        while let Some(row) = rows.next().await? {
            let Ok(name) = row.get::<String>("cluster") else {
                continue;
            };

            let record = clusters
                .entry(name.clone())
                .or_insert_with(|| ClusterRecord {
                    name,
                    created_at: row.get::<i64>("created_at").ok(),
                    members: Vec::new(),
                });

            if let Ok(member_ip) = row.get::<String>("member_ip") {
                record.members.push(NodeRecord {
                    name: row.get::<String>("member_name").unwrap_or_default(),
                    ip: member_ip,
                    status: row.get::<String>("member_status").unwrap_or_default(),
                    last_seen: row.get::<i64>("member_last_seen").ok(),
                });
            }
        }

        Ok(clusters.into_values().collect())
    }

    async fn ensure_cluster(&self, name: &str) -> Result<(), Error> {
        // ON CREATE keeps the original formation timestamp on re-formation.
        let q = query(
            "MERGE (c:MinioCluster {name: $name}) \
             ON CREATE SET c.created_at = timestamp()",
        )
        .param("name", name);

        self.graph.run(q).await?;

        Ok(())
    }

    async fn link_members(&self, cluster: &str, ips: &[String]) -> Result<(), Error> {
        if ips.is_empty() {
            return Ok(());
        }

        // Addresses without a matching node simply produce no edge.
        let q = query(
            "MATCH (c:MinioCluster {name: $name}) \
             UNWIND $ips AS ip \
             MATCH (n:MinioNode {ip: ip}) \
             MERGE (n)-[:MEMBER_OF]->(c)",
        )
        .param("name", cluster)
        .param("ips", ips.to_vec());

        self.graph.run(q).await?;

        Ok(())
    }

    async fn cluster_member_ips(&self, cluster: &str) -> Result<Vec<String>, Error> {
        let q = query("MATCH (c:MinioCluster {name: $name}) RETURN count(c) AS found")
            .param("name", cluster);

        let mut rows = self.graph.execute(q).await?;
        let found = match rows.next().await? {
            Some(row) => row.get::<i64>("found").unwrap_or(0),
            None => 0,
        };

        if found == 0 {
            return Err(Error::NotFound(format!("cluster '{cluster}'")));
        }

        let q = query(
            "MATCH (c:MinioCluster {name: $name})<-[:MEMBER_OF]-(n:MinioNode) \
             RETURN n.ip AS ip",
        )
        .param("name", cluster);

        let mut rows = self.graph.execute(q).await?;
        let mut ips = Vec::new();

        while let Some(row) = rows.next().await? {
            if let Ok(ip) = row.get::<String>("ip") {
                ips.push(ip);
            }
        }

        Ok(ips)
    }

    async fn delete_cluster(&self, name: &str) -> Result<(), Error> {
        let q = query("MATCH (c:MinioCluster {name: $name}) DETACH DELETE c").param("name", name);

        self.graph.run(q).await?;

        Ok(())
    }
}
