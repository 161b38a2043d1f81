//! Shared state for API handlers.

use std::sync::Arc;

use bloomnet_fleet::FleetManager;
use bloomnet_ledger::TopologyLedger;
use bloomnet_replication::ReplicationAdmin;

/// State shared by every API handler.
pub struct ApiContext<L, R>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    /// The fleet orchestrator behind the API.
    pub fleet: Arc<FleetManager<L, R>>,
}

impl<L, R> Clone for ApiContext<L, R>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    fn clone(&self) -> Self {
        Self {
            fleet: self.fleet.clone(),
        }
    }
}
