//! Topology reconciliation engine for the storage fleet.
//!
//! `FleetManager` drives every mutation across the three stores of truth:
//! the topology ledger (authoritative), the control-plane alias registry,
//! and the monitoring target feed (both derived projections). There is no
//! shared transaction between them, so each operation fixes an order,
//! makes the external commands idempotent (reset-then-join), and reports
//! projection gaps to the caller instead of hiding them.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::BTreeMap;

use bloomnet_health::HealthProber;
use bloomnet_ledger::{ClusterRecord, NodeRecord, NodeStatus, TopologyLedger};
use bloomnet_replication::{
    AliasDirectory, AliasEntry, CommandError, CommandErrorKind, ReplicationAdmin,
};
use bloomnet_targets::{TargetFeed, TargetKind};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Port layout of a storage node and registry defaults.
#[derive(Clone, Debug)]
pub struct FleetLayout {
    /// API port of service instance A.
    pub instance_a_port: u16,

    /// API port of service instance B.
    pub instance_b_port: u16,

    /// Default host-metrics exporter port.
    pub host_metrics_port: u16,

    /// Default server API port for new aliases.
    pub alias_port: u16,

    /// Default access key for new aliases.
    pub alias_access_key: String,

    /// Default secret key for new aliases.
    pub alias_secret_key: String,
}

impl Default for FleetLayout {
    fn default() -> Self {
        Self {
            instance_a_port: 9001,
            instance_b_port: 9003,
            host_metrics_port: 9100,
            alias_port: 9000,
            alias_access_key: "bloomadmin".to_owned(),
            alias_secret_key: "bloompassword".to_owned(),
        }
    }
}

/// Result of a node registration.
#[derive(Clone, Debug, Serialize)]
pub struct NodeRegistered {
    /// Node name as registered.
    pub name: String,

    /// Node address.
    pub ip: String,

    /// Computed health standing.
    pub status: NodeStatus,

    /// Whether service instance A answered its liveness check.
    pub instance_a: bool,

    /// Whether service instance B answered its liveness check.
    pub instance_b: bool,

    /// Projection updates that failed; the registration itself succeeded.
    pub warnings: Vec<String>,
}

/// Result of a node deregistration.
#[derive(Clone, Debug, Serialize)]
pub struct NodeRemoved {
    /// Node name as removed.
    pub name: String,

    /// Projection cleanups that failed.
    pub warnings: Vec<String>,
}

/// Result of a cluster formation.
#[derive(Clone, Debug, Serialize)]
pub struct ClusterFormed {
    /// Cluster name.
    pub name: String,

    /// The aliases the caller asked to join.
    pub members: Vec<String>,

    /// Aliases that resolved to an address and were linked in the ledger.
    pub resolved: BTreeMap<String, String>,

    /// Aliases that could not be resolved; their membership edges are
    /// missing until the next formation.
    pub unresolved: Vec<String>,

    /// Non-fatal failures encountered along the way.
    pub warnings: Vec<String>,
}

/// Result of a cluster dismantling.
#[derive(Clone, Debug, Serialize)]
pub struct ClusterDismantled {
    /// Cluster name.
    pub name: String,

    /// How many member nodes the ledger listed.
    pub member_count: usize,

    /// Per-member reset outcomes, including explicit notes for members
    /// that need a manual reset.
    pub logs: Vec<String>,
}

/// Result of wiping all buckets behind an alias.
#[derive(Clone, Debug, Serialize)]
pub struct AliasWiped {
    /// The wiped alias.
    pub alias: String,

    /// Command outcome notes.
    pub logs: Vec<String>,
}

/// Options for constructing a `FleetManager`.
pub struct FleetManagerOptions<L, R>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    /// Liveness prober for service instances.
    pub health: HealthProber,

    /// Authoritative topology store.
    pub ledger: L,

    /// Monitoring target feed projection.
    pub targets: TargetFeed,

    /// Control-plane command port.
    pub replication: R,

    /// Port layout and registry defaults.
    pub layout: FleetLayout,
}

/// Orchestrates node registration and cluster formation across the
/// ledger, the alias registry, and the monitoring feed.
#[derive(Clone)]
pub struct FleetManager<L, R>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    health: HealthProber,
    ledger: L,
    targets: TargetFeed,
    replication: R,
    layout: FleetLayout,
}

impl<L, R> FleetManager<L, R>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    /// Creates a new instance of `FleetManager`.
    #[must_use]
    pub fn new(
        FleetManagerOptions {
            health,
            ledger,
            targets,
            replication,
            layout,
        }: FleetManagerOptions<L, R>,
    ) -> Self {
        Self {
            health,
            ledger,
            targets,
            replication,
            layout,
        }
    }

    /// The port layout this fleet is configured with.
    #[must_use]
    pub const fn layout(&self) -> &FleetLayout {
        &self.layout
    }

    /// Registers a node, probing both service instances first.
    ///
    /// The ledger write is the success criterion: a degraded node is
    /// still registered, and target-feed failures only produce warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger write fails.
    pub async fn register_node(
        &self,
        name: &str,
        ip: &str,
        host_metrics_port: Option<u16>,
    ) -> Result<NodeRegistered, Error> {
        let instance_a = self.health.probe(ip, self.layout.instance_a_port).await;
        let instance_b = self.health.probe(ip, self.layout.instance_b_port).await;
        let status = NodeStatus::from_probes(instance_a, instance_b);

        if status == NodeStatus::Degraded {
            warn!("node {name} ({ip}) has unreachable instances: a={instance_a} b={instance_b}");
        }

        self.ledger
            .upsert_node(name, ip, status)
            .await
            .map_err(Error::from_ledger)?;

        let mut warnings = Vec::new();

        let storage_targets = vec![
            format!("{ip}:{}", self.layout.instance_a_port),
            format!("{ip}:{}", self.layout.instance_b_port),
        ];
        if let Err(e) = self
            .targets
            .upsert(TargetKind::Storage, name, &storage_targets)
            .await
        {
            warn!("failed to update storage targets for {name}: {e}");
            warnings.push(format!("storage target update failed: {e}"));
        }

        let metrics_port = host_metrics_port.unwrap_or(self.layout.host_metrics_port);
        let host_targets = vec![format!("{ip}:{metrics_port}")];
        if let Err(e) = self
            .targets
            .upsert(TargetKind::HostMetrics, name, &host_targets)
            .await
        {
            warn!("failed to update host-metrics targets for {name}: {e}");
            warnings.push(format!("host-metrics target update failed: {e}"));
        }

        info!("registered node {name} at {ip} as {status}");

        Ok(NodeRegistered {
            name: name.to_owned(),
            ip: ip.to_owned(),
            status,
            instance_a,
            instance_b,
            warnings,
        })
    }

    /// Deregisters a node by name.
    ///
    /// Strict, unlike registration: an unknown name is `NotFound`. The
    /// target collections are scrubbed for the alias either way, so a
    /// half-registered node cannot leave stale scrape targets behind.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no node matched, or another error if the
    /// ledger delete fails.
    pub async fn deregister_node(&self, name: &str) -> Result<NodeRemoved, Error> {
        let deletion = self
            .ledger
            .delete_node(name)
            .await
            .map_err(Error::from_ledger);

        let mut warnings = Vec::new();
        for kind in [TargetKind::Storage, TargetKind::HostMetrics] {
            if let Err(e) = self.targets.remove(kind, name).await {
                warn!("failed to remove {kind:?} targets for {name}: {e}");
                warnings.push(format!("target cleanup failed: {e}"));
            }
        }

        deletion?;

        info!("deregistered node {name}");

        Ok(NodeRemoved {
            name: name.to_owned(),
            warnings,
        })
    }

    /// Forms a replication cluster from the given aliases.
    ///
    /// Reset-then-join: every node is reset to a known-clean state
    /// (failures ignored), then one join command covers the full list.
    /// The cluster is recorded in the ledger even when no alias resolved,
    /// and the resolution map is returned so the caller can detect
    /// partial linkage.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for fewer than two aliases before any
    /// external call, `Replication` if the join fails with anything but
    /// an already-configured error, or a ledger error if the formation
    /// cannot be recorded.
    pub async fn form_cluster(&self, name: &str, aliases: &[String]) -> Result<ClusterFormed, Error> {
        if aliases.len() < 2 {
            return Err(Error::InvalidArgument(
                "cluster formation requires at least 2 aliases".to_owned(),
            ));
        }

        debug!("forming cluster '{name}' from {aliases:?}");

        // Known starting state: strip any prior replication config. A node
        // that is already clean fails this command, so failures are only
        // logged.
        for alias in aliases {
            if let Err(e) = self.replication.reset_replication(alias).await {
                debug!("pre-formation reset of '{alias}' failed: {e}");
            }
        }

        match self.replication.join_replication(aliases).await {
            Ok(()) => {}
            Err(e) if e.kind() == CommandErrorKind::AlreadyConfigured => {
                debug!("cluster '{name}' already formed: {e}");
            }
            Err(e) => return Err(Error::from_command(e)),
        }

        let mut warnings = Vec::new();
        let directory = match self.replication.list_aliases().await {
            Ok(entries) => AliasDirectory::from_entries(&entries),
            Err(e) => {
                warn!("alias resolution failed while forming '{name}': {e}");
                warnings.push(format!("alias resolution failed: {e}"));
                AliasDirectory::default()
            }
        };

        let mut resolved = BTreeMap::new();
        let mut unresolved = Vec::new();
        for alias in aliases {
            match directory.host(alias) {
                Some(host) => {
                    resolved.insert(alias.clone(), host.to_owned());
                }
                None => unresolved.push(alias.clone()),
            }
        }

        // The ledger records the declared cluster even when nothing
        // resolved; missing membership edges are surfaced via `unresolved`.
        self.ledger
            .ensure_cluster(name)
            .await
            .map_err(Error::from_ledger)?;

        let member_ips: Vec<String> = resolved.values().cloned().collect();
        self.ledger
            .link_members(name, &member_ips)
            .await
            .map_err(Error::from_ledger)?;

        info!(
            "formed cluster {name}: {} of {} members resolved",
            resolved.len(),
            aliases.len()
        );

        Ok(ClusterFormed {
            name: name.to_owned(),
            members: aliases.to_vec(),
            resolved,
            unresolved,
            warnings,
        })
    }

    /// Dismantles a cluster: resets every resolvable member, then deletes
    /// the cluster from the ledger.
    ///
    /// Ledger cleanup proceeds regardless of how many resets succeeded;
    /// members without a resolvable alias are reported as needing a
    /// manual reset.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ledger does not know the cluster; the
    /// registry is not touched in that case.
    pub async fn dismantle_cluster(&self, name: &str) -> Result<ClusterDismantled, Error> {
        let member_ips = self
            .ledger
            .cluster_member_ips(name)
            .await
            .map_err(Error::from_ledger)?;

        let mut logs = Vec::new();
        let directory = match self.replication.list_aliases().await {
            Ok(entries) => AliasDirectory::from_entries(&entries),
            Err(e) => {
                warn!("alias resolution failed while dismantling '{name}': {e}");
                logs.push(format!("alias resolution failed: {e}"));
                AliasDirectory::default()
            }
        };

        for ip in &member_ips {
            match directory.alias_for(ip) {
                Some(alias) => match self.replication.reset_replication(alias).await {
                    Ok(()) => logs.push(format!("reset alias '{alias}' (ip {ip})")),
                    Err(e) => logs.push(format!("reset of alias '{alias}' (ip {ip}) failed: {e}")),
                },
                None => logs.push(format!(
                    "no alias found for ip {ip}; manual replication reset required"
                )),
            }
        }

        self.ledger
            .delete_cluster(name)
            .await
            .map_err(Error::from_ledger)?;

        info!("dismantled cluster {name} ({} members)", member_ips.len());

        Ok(ClusterDismantled {
            name: name.to_owned(),
            member_count: member_ips.len(),
            logs,
        })
    }

    /// Lists every registered node.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be queried.
    pub async fn list_nodes(&self) -> Result<Vec<NodeRecord>, Error> {
        self.ledger.list_nodes().await.map_err(Error::from_ledger)
    }

    /// Lists every cluster with its materialized member list.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be queried.
    pub async fn list_clusters(&self) -> Result<Vec<ClusterRecord>, Error> {
        self.ledger
            .list_clusters()
            .await
            .map_err(Error::from_ledger)
    }

    /// Manually checks the liveness of one service instance.
    pub async fn node_health(&self, ip: &str, port: u16) -> bool {
        self.health.probe(ip, port).await
    }

    /// Registers a connection alias, filling in layout defaults.
    ///
    /// Returns the URL the alias was pointed at.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the alias.
    pub async fn create_alias(
        &self,
        alias: &str,
        ip: &str,
        port: Option<u16>,
        access_key: Option<&str>,
        secret_key: Option<&str>,
    ) -> Result<String, Error> {
        let port = port.unwrap_or(self.layout.alias_port);
        let url = format!("http://{ip}:{port}");
        let access_key = access_key.unwrap_or(&self.layout.alias_access_key);
        let secret_key = secret_key.unwrap_or(&self.layout.alias_secret_key);

        self.replication
            .set_alias(alias, &url, access_key, secret_key)
            .await
            .map_err(Error::from_command)?;

        info!("configured alias {alias} -> {url}");

        Ok(url)
    }

    /// Lists the raw registry entries, malformed URLs included.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be listed.
    pub async fn list_aliases(&self) -> Result<Vec<AliasEntry>, Error> {
        self.replication
            .list_aliases()
            .await
            .map_err(Error::from_command)
    }

    /// Removes a connection alias.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the removal.
    pub async fn remove_alias(&self, alias: &str) -> Result<(), Error> {
        self.replication
            .remove_alias(alias)
            .await
            .map_err(Error::from_command)?;

        info!("removed alias {alias}");

        Ok(())
    }

    /// Wipes all buckets behind an alias. Destructive.
    ///
    /// An alias with nothing to wipe counts as success.
    ///
    /// # Errors
    ///
    /// Returns an error if the wipe fails for any other reason.
    pub async fn wipe_alias(&self, alias: &str) -> Result<AliasWiped, Error> {
        match self.replication.wipe_buckets(alias).await {
            Ok(()) => Ok(AliasWiped {
                alias: alias.to_owned(),
                logs: vec!["all buckets removed".to_owned()],
            }),
            Err(e) if e.kind() == CommandErrorKind::NotFound => Ok(AliasWiped {
                alias: alias.to_owned(),
                logs: vec![format!("nothing to wipe: {e}")],
            }),
            Err(e) => Err(Error::from_command(e)),
        }
    }
}
