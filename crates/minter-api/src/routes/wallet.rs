//! Wallet connection through the browser bridge

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use cat8004::fetch_account_snapshot;
use minter_core::{Address, ProtocolError};
use wallet_bridge::RequestStatus;

use crate::dto::{AccountResponse, ApiError, WalletConnectResponse, WalletStatusResponse};
use crate::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Create wallet routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connect", post(connect))
        .route("/status", get(get_status))
        .route("/disconnect", post(disconnect))
        .route("/account", get(get_account))
}

/// POST /wallet/connect - Open a connect request in the bridge
pub async fn connect(State(state): State<AppState>) -> ApiResult<WalletConnectResponse> {
    let bridge = state.bridge_server().await.map_err(|e| e.to_response())?;
    let chain_id = state.network().await.chain_id();

    // Only the latest connect request is tracked
    if let Some(previous) = state.pending_connect().await {
        bridge.cancel_request(&previous).await;
    }

    let (request_id, connect_url) = bridge.create_connect_request(chain_id).await;
    state.set_pending_connect(Some(request_id.clone())).await;
    tracing::info!("Wallet connect request {} opened", request_id);

    Ok(Json(WalletConnectResponse {
        request_id,
        connect_url,
    }))
}

/// GET /wallet/status - Connected account, or the pending request's outcome
pub async fn get_status(State(state): State<AppState>) -> ApiResult<WalletStatusResponse> {
    if let Some(wallet) = state.wallet().await {
        return Ok(Json(WalletStatusResponse::connected(wallet.address.as_str())));
    }

    let Some(request_id) = state.pending_connect().await else {
        return Ok(Json(WalletStatusResponse::not_connected("disconnected", None)));
    };
    let bridge = state.bridge_server().await.map_err(|e| e.to_response())?;

    let response = match bridge.get_request_status(&request_id).await {
        Some(RequestStatus::Pending) => WalletStatusResponse::not_connected("pending", None),
        Some(RequestStatus::AddressReceived(address)) => {
            state
                .set_wallet(Address::new(address.clone()))
                .await
                .map_err(|e| e.to_response())?;
            state.set_pending_connect(None).await;
            bridge.cancel_request(&request_id).await;
            tracing::info!("Wallet connected: {}", address);
            WalletStatusResponse::connected(address)
        }
        Some(RequestStatus::Rejected) => {
            state.set_pending_connect(None).await;
            WalletStatusResponse::not_connected("rejected", None)
        }
        Some(RequestStatus::Failed(error)) => {
            state.set_pending_connect(None).await;
            WalletStatusResponse::not_connected("failed", Some(error))
        }
        Some(RequestStatus::Expired) | None => {
            state.set_pending_connect(None).await;
            WalletStatusResponse::not_connected("expired", None)
        }
        Some(RequestStatus::TxSubmitted { .. }) => {
            WalletStatusResponse::not_connected("failed", Some("Unexpected answer".to_string()))
        }
    };

    Ok(Json(response))
}

/// POST /wallet/disconnect
pub async fn disconnect(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    state.disconnect_wallet().await;
    Json(WalletStatusResponse::not_connected("disconnected", None))
}

/// GET /wallet/account - Balance and collectibles owed to the connected account
pub async fn get_account(State(state): State<AppState>) -> ApiResult<AccountResponse> {
    let to_response = |e: ProtocolError| crate::ApiError::from(e).to_response();

    let address = state
        .wallet_address()
        .await
        .ok_or_else(|| to_response(ProtocolError::WalletNotConnected))?;
    let contract = state.sale_contract().await.map_err(to_response)?;
    let client = state.rpc_client().await.ok_or_else(|| {
        to_response(ProtocolError::StateUnavailable {
            reason: "RPC endpoint unreachable".to_string(),
        })
    })?;

    let snapshot = fetch_account_snapshot(&client, &contract.address, &address)
        .await
        .map_err(to_response)?;

    Ok(Json(AccountResponse {
        address: snapshot.address.to_string(),
        token_balance: snapshot.token_balance,
        token_balance_raw: snapshot.token_balance_raw,
        expected_nft_count: snapshot.expected_nft_count,
    }))
}
