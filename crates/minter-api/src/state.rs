//! Application state shared across API handlers

use std::sync::Arc;
use std::time::Instant;

use axum::{http::StatusCode, Json};
use cat8004::{PurchaseError, PurchaseSession, SaleContract};
use evm_rpc_client::RpcClient;
use minter_core::{Address, AppConfig, Network, ProtocolError, RpcConfig, SaleParams};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use wallet_bridge::BridgeServer;

use crate::dto;

/// Errors that can occur in the API layer
#[derive(Debug, Error)]
pub enum ApiError {
    /// Wallet reported an address that is not a 20-byte hex address
    #[error("Invalid wallet address: {reason}")]
    InvalidAddress { reason: String },

    /// Wallet bridge failed to bind
    #[error("Wallet bridge error: {0}")]
    BridgeServer(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Purchase(#[from] PurchaseError),
}

impl ApiError {
    /// Machine-readable code and HTTP status for the error body
    pub fn to_response(&self) -> (StatusCode, Json<dto::ApiError>) {
        let (status, code) = match self {
            Self::InvalidAddress { .. } => (400, "invalid_address"),
            Self::BridgeServer(_) => (500, "wallet_bridge_error"),
            Self::Protocol(e) => (e.status_code(), e.error_code()),
            Self::Purchase(PurchaseError::Blocked(reason)) => {
                let e = ProtocolError::from(reason.clone());
                (e.status_code(), e.error_code())
            }
            Self::Purchase(PurchaseError::State(e)) => (e.status_code(), e.error_code()),
            Self::Purchase(PurchaseError::Build(_)) => (500, "build_failed"),
            Self::Purchase(PurchaseError::Wallet(_)) => (503, "wallet_unavailable"),
        };
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(dto::ApiError::new(code, self.to_string())),
        )
    }
}

/// State representing a connected wallet
#[derive(Clone, Debug)]
pub struct WalletState {
    /// Account the wallet selected, as reported (checksum casing kept)
    pub address: Address,
    /// When the wallet was connected
    pub connected_at: Instant,
}

impl WalletState {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            connected_at: Instant::now(),
        }
    }
}

fn validate_account_address(address: &Address) -> Result<(), ApiError> {
    if !address.as_str().starts_with("0x") {
        return Err(ApiError::InvalidAddress {
            reason: "Address must start with 0x".to_string(),
        });
    }
    if !address.is_well_formed() {
        return Err(ApiError::InvalidAddress {
            reason: format!(
                "Expected 40 hex characters after 0x, got {:?}",
                &address.as_str()[2..]
            ),
        });
    }
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    rpc_client: RwLock<Option<RpcClient>>,
    wallet: RwLock<Option<WalletState>>,
    bridge_server: RwLock<Option<Arc<BridgeServer>>>,
    /// Connect request the frontend is waiting on
    pending_connect: RwLock<Option<String>>,
    session: Mutex<PurchaseSession>,
}

impl AppState {
    /// Create a new application state with default config
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create with a specific config
    pub fn with_config(config: AppConfig) -> Self {
        let session = PurchaseSession::new(&config.sale.params);
        Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                rpc_client: RwLock::new(None),
                wallet: RwLock::new(None),
                bridge_server: RwLock::new(None),
                pending_connect: RwLock::new(None),
                session: Mutex::new(session),
            }),
        }
    }

    /// Get current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    pub async fn sale_params(&self) -> SaleParams {
        self.inner.config.read().await.sale.params.clone()
    }

    /// Get current network
    pub async fn network(&self) -> Network {
        self.inner.config.read().await.network
    }

    /// Sale contract for the configured network
    pub async fn sale_contract(&self) -> Result<SaleContract, ProtocolError> {
        let config = self.inner.config.read().await;
        SaleContract::for_network(config.network, &config.sale).ok_or_else(|| {
            ProtocolError::NetworkNotSupported {
                network: config.network.to_string(),
            }
        })
    }

    /// Update RPC configuration
    pub async fn set_rpc_config(&self, rpc_config: RpcConfig) {
        let mut config = self.inner.config.write().await;
        config.rpc = rpc_config;

        // Clear cached client
        let mut client = self.inner.rpc_client.write().await;
        *client = None;
    }

    /// Get or create the RPC client. `None` while the endpoint is unreachable.
    pub async fn rpc_client(&self) -> Option<RpcClient> {
        {
            let client = self.inner.rpc_client.read().await;
            if client.is_some() {
                return client.clone();
            }
        }

        let (rpc, chain_id) = {
            let config = self.inner.config.read().await;
            (config.rpc.clone(), config.network.chain_id())
        };
        tracing::debug!("Creating RPC client for {}", rpc.url);
        match RpcClient::new(rpc.clone(), chain_id).await {
            Ok(client) => {
                tracing::info!("RPC client connected to {}", rpc.url);
                let mut cached = self.inner.rpc_client.write().await;
                *cached = Some(client.clone());
                Some(client)
            }
            Err(e) => {
                tracing::warn!("Failed to create RPC client for {}: {}", rpc.url, e);
                None
            }
        }
    }

    /// Drop the cached client and reconnect
    pub async fn refresh_rpc_client(&self) -> Option<RpcClient> {
        let mut client = self.inner.rpc_client.write().await;
        *client = None;
        drop(client);

        self.rpc_client().await
    }

    /// Get current wallet state
    pub async fn wallet(&self) -> Option<WalletState> {
        self.inner.wallet.read().await.clone()
    }

    pub async fn wallet_address(&self) -> Option<Address> {
        self.inner.wallet.read().await.as_ref().map(|w| w.address.clone())
    }

    /// Set connected wallet with address validation.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidAddress` if the address is not 20 bytes of hex.
    pub async fn set_wallet(&self, address: Address) -> Result<(), ApiError> {
        validate_account_address(&address)?;
        let mut wallet = self.inner.wallet.write().await;
        *wallet = Some(WalletState::new(address));
        Ok(())
    }

    /// Disconnect wallet (clear wallet state)
    pub async fn disconnect_wallet(&self) {
        let mut wallet = self.inner.wallet.write().await;
        *wallet = None;
        let mut pending = self.inner.pending_connect.write().await;
        *pending = None;
    }

    pub async fn pending_connect(&self) -> Option<String> {
        self.inner.pending_connect.read().await.clone()
    }

    pub async fn set_pending_connect(&self, request_id: Option<String>) {
        let mut pending = self.inner.pending_connect.write().await;
        *pending = request_id;
    }

    /// The purchase session
    pub fn session(&self) -> &Mutex<PurchaseSession> {
        &self.inner.session
    }

    /// Get or start the wallet bridge.
    ///
    /// # Errors
    /// Returns `ApiError::BridgeServer` if the bridge fails to bind.
    pub async fn bridge_server(&self) -> Result<Arc<BridgeServer>, ApiError> {
        {
            let server = self.inner.bridge_server.read().await;
            if let Some(ref s) = *server {
                return Ok(s.clone());
            }
        }

        let mut server_lock = self.inner.bridge_server.write().await;

        // Double-check after acquiring write lock
        if let Some(ref s) = *server_lock {
            return Ok(s.clone());
        }

        let port = self.inner.config.read().await.bridge_port;
        let server = BridgeServer::start_on_port(port).await.map_err(|e| {
            tracing::error!("Failed to start wallet bridge: {}", e);
            e
        })?;

        tracing::info!("Wallet bridge started on port {}", server.port());
        let server = Arc::new(server);
        *server_lock = Some(server.clone());
        Ok(server)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cat8004::BlockReason;

    const ACCOUNT: &str = "0x00000000000000000000000000000000000000aa";

    #[tokio::test]
    async fn test_set_wallet_validates() {
        let state = AppState::new();
        assert!(state.set_wallet(Address::new(ACCOUNT)).await.is_ok());
        assert_eq!(state.wallet_address().await, Some(Address::new(ACCOUNT)));

        let err = state.set_wallet(Address::new("vitalik.eth")).await;
        assert!(matches!(err, Err(ApiError::InvalidAddress { .. })));
        let err = state.set_wallet(Address::new("0x1234")).await;
        assert!(matches!(err, Err(ApiError::InvalidAddress { .. })));

        state.disconnect_wallet().await;
        assert!(state.wallet().await.is_none());
    }

    #[tokio::test]
    async fn test_sale_contract_requires_address() {
        let state = AppState::new();
        assert!(matches!(
            state.sale_contract().await,
            Err(ProtocolError::NetworkNotSupported { .. })
        ));

        let mut config = AppConfig::default();
        config.sale.contract_address =
            Some(Address::new("0x0000000000000000000000000000000000008004"));
        let state = AppState::with_config(config);
        let contract = state.sale_contract().await.unwrap();
        assert_eq!(contract.network, Network::Base);
    }

    #[tokio::test]
    async fn test_unreachable_rpc_yields_none() {
        let mut config = AppConfig::default();
        config.rpc.url = "http://127.0.0.1:1".to_string();
        let state = AppState::with_config(config);
        assert!(state.rpc_client().await.is_none());
    }

    #[test]
    fn test_error_responses() {
        let (status, body) =
            ApiError::Purchase(PurchaseError::Blocked(BlockReason::SoldOut)).to_response();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.code, "sold_out");

        let (status, body) =
            ApiError::Protocol(ProtocolError::WalletNotConnected).to_response();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.code, "wallet_not_connected");

        let (status, body) = ApiError::Purchase(PurchaseError::Wallet(
            minter_core::TxError::SubmissionFailed {
                message: "bridge offline".to_string(),
            },
        ))
        .to_response();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "wallet_unavailable");
    }
}
