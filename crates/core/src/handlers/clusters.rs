use axum::Json;
use axum::extract::{Form, Path, State};
use bloomnet_ledger::TopologyLedger;
use bloomnet_replication::ReplicationAdmin;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::ApiContext;

pub(crate) async fn list_clusters_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
) -> Result<Json<Vec<Value>>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let clusters = ctx.fleet.list_clusters().await?;

    let body = clusters
        .into_iter()
        .map(|cluster| {
            json!({
                "name": cluster.name,
                "created_at": cluster.created_at,
                "node_count": cluster.members.len(),
                "nodes": cluster.members,
            })
        })
        .collect();

    Ok(Json(body))
}

#[derive(Deserialize)]
pub(crate) struct CreateClusterForm {
    name: String,
    /// Comma-separated alias list; empty items are dropped before the
    /// minimum-size check.
    aliases: String,
}

pub(crate) async fn create_cluster_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
    Form(form): Form<CreateClusterForm>,
) -> Result<Json<Value>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let aliases: Vec<String> = form
        .aliases
        .split(',')
        .map(str::trim)
        .filter(|alias| !alias.is_empty())
        .map(str::to_owned)
        .collect();

    let outcome = ctx.fleet.form_cluster(&form.name, &aliases).await?;

    Ok(Json(json!({
        "status": "success",
        "cluster": outcome.name,
        "members": outcome.members,
        "resolved": outcome.resolved,
        "unresolved": outcome.unresolved,
        "warnings": outcome.warnings,
    })))
}

pub(crate) async fn delete_cluster_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let outcome = ctx.fleet.dismantle_cluster(&name).await?;

    Ok(Json(json!({
        "status": "deleted",
        "cluster": outcome.name,
        "member_count": outcome.member_count,
        "logs": outcome.logs,
    })))
}
