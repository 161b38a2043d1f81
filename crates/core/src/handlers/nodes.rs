use axum::Json;
use axum::extract::{Form, Path, State};
use bloomnet_ledger::TopologyLedger;
use bloomnet_replication::ReplicationAdmin;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::ApiContext;

#[derive(Deserialize)]
pub(crate) struct RegisterNodeForm {
    name: String,
    ip: String,
    node_port: Option<u16>,
}

pub(crate) async fn register_node_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
    Form(form): Form<RegisterNodeForm>,
) -> Result<Json<Value>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let outcome = ctx
        .fleet
        .register_node(&form.name, &form.ip, form.node_port)
        .await?;

    Ok(Json(json!({
        "status": "registered",
        "node": outcome.name,
        "ip": outcome.ip,
        "health": {
            "status": outcome.status,
            "instance_a": outcome.instance_a,
            "instance_b": outcome.instance_b,
        },
        "warnings": outcome.warnings,
    })))
}

pub(crate) async fn list_nodes_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
) -> Result<Json<Vec<Value>>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    fn instance(ip: &str, label: &str, port: u16) -> Value {
        json!({
            "type": label,
            "port": port,
            "api": format!("http://{ip}:{port}"),
            "console": format!("http://{ip}:{}", port + 1),
        })
    }

    let layout = ctx.fleet.layout().clone();
    let nodes = ctx.fleet.list_nodes().await?;

    let body = nodes
        .into_iter()
        .map(|node| {
            let instances = vec![
                instance(&node.ip, "Instance A", layout.instance_a_port),
                instance(&node.ip, "Instance B", layout.instance_b_port),
            ];

            json!({
                "name": node.name,
                "ip": node.ip,
                "status": node.status,
                "last_seen": node.last_seen,
                "instances": instances,
            })
        })
        .collect();

    Ok(Json(body))
}

pub(crate) async fn delete_node_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let outcome = ctx.fleet.deregister_node(&name).await?;

    Ok(Json(json!({
        "status": "deleted",
        "node": outcome.name,
        "warnings": outcome.warnings,
    })))
}
