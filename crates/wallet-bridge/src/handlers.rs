//! HTTP request handlers for the wallet bridge

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use std::sync::Arc;

use minter_core::UnsignedTx;

use crate::pages::{generate_connect_page, generate_signing_page};
use crate::server::ServerState;
use crate::types::{PendingRequest, RequestStatus, RequestType, WalletCallback};

/// Look up a live request, marking it expired if it has run out
fn live_request<'a>(
    requests: &'a mut std::collections::HashMap<String, PendingRequest>,
    request_id: &str,
) -> Result<&'a mut PendingRequest, StatusCode> {
    let request = requests.get_mut(request_id).ok_or(StatusCode::NOT_FOUND)?;
    if request.is_expired() {
        request.status = RequestStatus::Expired;
        return Err(StatusCode::GONE);
    }
    Ok(request)
}

/// Serve the connect page
/// GET /connect/{id}
pub async fn handle_connect_page(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let mut requests = state.pending_requests.write().await;
    let request = live_request(&mut requests, &request_id)?;

    let chain_id = match request.request_type {
        RequestType::Connect { chain_id } => chain_id,
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    Ok(Html(generate_connect_page(
        &request_id,
        chain_id,
        &state.base_url(),
    )))
}

/// Serve the signing page
/// GET /sign/{id}
pub async fn handle_sign_page(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let mut requests = state.pending_requests.write().await;
    let request = live_request(&mut requests, &request_id)?;

    let message = match &request.request_type {
        RequestType::SendTransaction { message, .. } => message.clone(),
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    Ok(Html(generate_signing_page(
        &request_id,
        &message,
        &state.base_url(),
    )))
}

/// Return the unsigned transaction for the signing page
/// GET /tx/{id}
pub async fn handle_tx(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
) -> Result<Json<UnsignedTx>, StatusCode> {
    let mut requests = state.pending_requests.write().await;
    let request = live_request(&mut requests, &request_id)?;

    match &request.request_type {
        RequestType::SendTransaction { unsigned_tx, .. } => Ok(Json(unsigned_tx.clone())),
        _ => Err(StatusCode::BAD_REQUEST),
    }
}

/// Handle the wallet page's result
/// POST /callback/{id}
pub async fn handle_callback(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
    Json(payload): Json<WalletCallback>,
) -> Result<StatusCode, StatusCode> {
    let mut requests = state.pending_requests.write().await;
    let request = live_request(&mut requests, &request_id)?;

    // First answer wins
    if !request.status.is_pending() {
        return Err(StatusCode::CONFLICT);
    }

    let status = request
        .apply_callback(&payload)
        .ok_or(StatusCode::BAD_REQUEST)?;

    match &status {
        RequestStatus::AddressReceived(address) => {
            tracing::info!("Wallet connected: {} for request {}", address, request_id)
        }
        RequestStatus::TxSubmitted { tx_hash } => {
            tracing::info!("Transaction submitted: {} for request {}", tx_hash, request_id)
        }
        RequestStatus::Rejected => tracing::info!("Request {} rejected in wallet", request_id),
        other => tracing::warn!("Request {} ended with {:?}", request_id, other),
    }

    Ok(StatusCode::OK)
}
