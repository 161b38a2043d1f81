use axum::Json;
use axum::extract::{Form, Path, State};
use bloomnet_ledger::TopologyLedger;
use bloomnet_replication::ReplicationAdmin;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::ApiContext;

#[derive(Deserialize)]
pub(crate) struct CreateAliasForm {
    alias: String,
    ip: String,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
}

pub(crate) async fn create_alias_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
    Form(form): Form<CreateAliasForm>,
) -> Result<Json<Value>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let url = ctx
        .fleet
        .create_alias(
            &form.alias,
            &form.ip,
            form.port,
            form.user.as_deref(),
            form.password.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "status": "success",
        "alias": form.alias,
        "target": url,
        "message": "Alias configured successfully",
    })))
}

pub(crate) async fn list_aliases_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
) -> Result<Json<Value>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let aliases = ctx.fleet.list_aliases().await?;

    Ok(Json(json!({
        "count": aliases.len(),
        "aliases": aliases,
    })))
}

pub(crate) async fn remove_alias_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
    Path(alias): Path<String>,
) -> Result<Json<Value>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    ctx.fleet.remove_alias(&alias).await?;

    Ok(Json(json!({
        "status": "success",
        "alias": alias,
        "message": "Alias removed successfully",
    })))
}

#[derive(Deserialize)]
pub(crate) struct WipeAliasForm {
    alias: String,
}

pub(crate) async fn wipe_alias_handler<L, R>(
    State(ctx): State<ApiContext<L, R>>,
    Form(form): Form<WipeAliasForm>,
) -> Result<Json<Value>, ApiError>
where
    L: TopologyLedger,
    R: ReplicationAdmin,
{
    let outcome = ctx.fleet.wipe_alias(&form.alias).await?;

    Ok(Json(json!({
        "status": "wiped",
        "alias": outcome.alias,
        "logs": outcome.logs,
    })))
}
