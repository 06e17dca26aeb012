//! Health probe.

use crate::router::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub is_online: bool,
    pub server_version: Option<String>,
    pub is_utxo_indexed: Option<bool>,
    pub is_synced: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStatus {
    pub is_online: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub kaspad: NodeStatus,
    pub database: DatabaseStatus,
}

/// Probe the node and, when configured, the database.
///
/// Answers 500 with the same body when a probe fails or the node is not
/// synced.
pub async fn ping(State(state): State<AppState>) -> Response {
    let mut result = PingResponse::default();
    let mut failed = false;

    match state.node.get_info().await {
        Ok(info) => {
            result.kaspad = NodeStatus {
                is_online: true,
                server_version: Some(info.server_version),
                is_utxo_indexed: Some(info.is_utxo_indexed),
                is_synced: Some(info.is_synced),
            };
        }
        Err(e) => {
            error!(error = %e, "Node health check failed");
            failed = true;
        }
    }

    if let Some(index) = &state.index {
        match index.mapping().ping().await {
            Ok(()) => result.database.is_online = true,
            Err(e) => {
                error!(error = %e, "Database health check failed");
                failed = true;
            }
        }
    }

    if failed || result.kaspad.is_synced != Some(true) {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(result)).into_response()
    } else {
        Json(result).into_response()
    }
}
