//! Router assembly for the kernel API.

use axum::http::StatusCode;
use axum::routing::{any, delete, get, post};
use axum::Router;
use bloomnet_ledger::TopologyLedger;
use bloomnet_replication::ReplicationAdmin;
use tower_http::cors::CorsLayer;

use crate::handlers::{
    create_alias_handler, create_cluster_handler, delete_cluster_handler, delete_node_handler,
    health_check_node_handler, list_aliases_handler, list_clusters_handler, list_nodes_handler,
    liveness_handler, register_node_handler, remove_alias_handler, wipe_alias_handler,
};
use crate::state::ApiContext;

/// Builds the full API router around the given context.
pub fn build_router<L, R>(ctx: ApiContext<L, R>) -> Router
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let router: Router<ApiContext<L, R>> = Router::new()
        .route("/", get(liveness_handler))
        .route("/health-check-node", get(health_check_node_handler::<L, R>))
        // ** Nodes **
        .route("/nodes", get(list_nodes_handler::<L, R>))
        .route("/register-node", post(register_node_handler::<L, R>))
        .route("/nodes/{name}", delete(delete_node_handler::<L, R>))
        // ** Clusters **
        .route(
            "/clusters",
            get(list_clusters_handler::<L, R>).post(create_cluster_handler::<L, R>),
        )
        .route("/clusters/{name}", delete(delete_cluster_handler::<L, R>))
        // ** Aliases **
        .route(
            "/aliases",
            get(list_aliases_handler::<L, R>).post(create_alias_handler::<L, R>),
        )
        .route("/aliases/{alias}", delete(remove_alias_handler::<L, R>))
        .route("/wipe-alias", post(wipe_alias_handler::<L, R>));

    router
        .fallback(any(|| async { (StatusCode::NOT_FOUND, "") }))
        .layer(CorsLayer::very_permissive())
        .with_state(ctx)
}
