use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bloomnet_ledger::TopologyLedger;
use bloomnet_replication::ReplicationAdmin;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::state::ApiContext;

pub(crate) async fn liveness_handler() -> Json<Value> {
    Json(json!({
        "status": "BloomNet Kernel Online",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Deserialize)]
pub(crate) struct HealthCheckQuery {
    ip: String,
    port: u16,
}

pub(crate) async fn health_check_node_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
    Query(query): Query<HealthCheckQuery>,
) -> Response
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let target = format!("{}:{}", query.ip, query.port);

    if ctx.fleet.node_health(&query.ip, query.port).await {
        Json(json!({ "status": "online", "target": target })).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "detail": format!("Node {target} is unreachable") })),
        )
            .into_response()
    }
}
