//! CLI binary that boots the BloomNet kernel control plane.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bloomnet_core::{ApiContext, build_router};
use bloomnet_fleet::{FleetLayout, FleetManager, FleetManagerOptions};
use bloomnet_health::HealthProber;
use bloomnet_ledger_neo4j::{Neo4jLedger, Neo4jLedgerOptions};
use bloomnet_replication_mc::{McAdmin, McAdminOptions};
use bloomnet_targets::TargetFeed;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
enum Error {
    /// Failed to bind the API listener.
    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),

    /// Ledger connection failed at startup.
    #[error(transparent)]
    Ledger(#[from] bloomnet_ledger_neo4j::Error),

    /// Serving the API failed.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to serve the API on
    #[arg(long, default_value = "0.0.0.0:8000", env = "BLOOMNET_LISTEN_ADDR")]
    listen_addr: SocketAddr,

    /// Bolt URI of the topology ledger
    #[arg(
        long,
        default_value = "bolt://localhost:7687",
        env = "BLOOMNET_NEO4J_URI"
    )]
    neo4j_uri: String,

    /// Ledger username
    #[arg(long, default_value = "neo4j", env = "BLOOMNET_NEO4J_USER")]
    neo4j_user: String,

    /// Ledger password
    #[arg(long, default_value = "bloomledger123", env = "BLOOMNET_NEO4J_PASSWORD")]
    neo4j_password: String,

    /// Directory holding the monitoring target files
    #[arg(long, default_value = ".", env = "BLOOMNET_TARGETS_DIR")]
    targets_dir: PathBuf,

    /// Path to the mc binary
    #[arg(long, default_value = "mc", env = "BLOOMNET_MC_BIN")]
    mc_bin: String,

    /// Health probe timeout in milliseconds
    #[arg(long, default_value_t = 2000, env = "BLOOMNET_PROBE_TIMEOUT_MS")]
    probe_timeout_ms: u64,

    /// mc command timeout in milliseconds
    #[arg(long, default_value_t = 15000, env = "BLOOMNET_COMMAND_TIMEOUT_MS")]
    command_timeout_ms: u64,

    /// Default access key for new aliases
    #[arg(long, default_value = "bloomadmin", env = "BLOOMNET_ALIAS_ACCESS_KEY")]
    alias_access_key: String,

    /// Default secret key for new aliases
    #[arg(long, default_value = "bloompassword", env = "BLOOMNET_ALIAS_SECRET_KEY")]
    alias_secret_key: String,

    /// Default host-metrics exporter port
    #[arg(long, default_value_t = 9100, env = "BLOOMNET_HOST_METRICS_PORT")]
    host_metrics_port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()).await {
        error!("fatal: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let ledger = Neo4jLedger::connect(Neo4jLedgerOptions {
        uri: args.neo4j_uri.clone(),
        user: args.neo4j_user.clone(),
        password: args.neo4j_password.clone(),
    })
    .await?;
    info!("connected to topology ledger at {}", args.neo4j_uri);

    let layout = FleetLayout {
        host_metrics_port: args.host_metrics_port,
        alias_access_key: args.alias_access_key.clone(),
        alias_secret_key: args.alias_secret_key.clone(),
        ..FleetLayout::default()
    };

    let fleet = FleetManager::new(FleetManagerOptions {
        health: HealthProber::new(Duration::from_millis(args.probe_timeout_ms)),
        ledger,
        targets: TargetFeed::new(&args.targets_dir),
        replication: McAdmin::new(McAdminOptions {
            binary: args.mc_bin.clone(),
            timeout: Duration::from_millis(args.command_timeout_ms),
        }),
        layout,
    });

    let router = build_router(ApiContext {
        fleet: Arc::new(fleet),
    });

    let listener = tokio::net::TcpListener::bind(args.listen_addr)
        .await
        .map_err(|e| Error::Bind(args.listen_addr, e))?;
    info!("kernel API listening on {}", args.listen_addr);

    axum::serve(listener, router).await.map_err(Error::Serve)
}
