mod aliases;
mod clusters;
mod health;
mod nodes;

pub(crate) use aliases::{
    create_alias_handler, list_aliases_handler, remove_alias_handler, wipe_alias_handler,
};
pub(crate) use clusters::{create_cluster_handler, delete_cluster_handler, list_clusters_handler};
pub(crate) use health::{health_check_node_handler, liveness_handler};
pub(crate) use nodes::{delete_node_handler, list_nodes_handler, register_node_handler};
