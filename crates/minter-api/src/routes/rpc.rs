//! RPC endpoint status and configuration

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use minter_core::RpcConfig;

use crate::dto::{ApiError, RpcConfigRequest, RpcStatusResponse};
use crate::AppState;

/// Create RPC routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/configure", post(configure))
}

/// GET /rpc/status - Reachability and chain of the configured endpoint
pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<RpcStatusResponse>, (StatusCode, Json<ApiError>)> {
    let config = state.config().await;
    let expected_chain_id = config.network.chain_id();

    let caps = match state.rpc_client().await {
        Some(client) => client.capabilities().await,
        None => None,
    };

    Ok(Json(match caps {
        Some(caps) => RpcStatusResponse {
            connected: caps.is_online,
            url: config.rpc.url,
            network: config.network.as_str().to_string(),
            expected_chain_id,
            chain_id: caps.chain_id,
            block_number: caps.block_number,
            capability_tier: caps.capability_tier.as_str().to_string(),
        },
        None => RpcStatusResponse {
            connected: false,
            url: config.rpc.url,
            network: config.network.as_str().to_string(),
            expected_chain_id,
            chain_id: None,
            block_number: 0,
            capability_tier: "Offline".to_string(),
        },
    }))
}

/// POST /rpc/configure - Point the minter at another endpoint
pub async fn configure(
    State(state): State<AppState>,
    Json(request): Json<RpcConfigRequest>,
) -> Result<Json<RpcStatusResponse>, (StatusCode, Json<ApiError>)> {
    let url = request.url.trim().to_string();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request(format!("Unsupported RPC URL: {}", url))),
        ));
    }

    state.set_rpc_config(RpcConfig { url }).await;
    let _ = state.refresh_rpc_client().await;

    get_status(State(state)).await
}
