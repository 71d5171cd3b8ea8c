//! Axum HTTP server for the wallet bridge

use axum::{routing::get, routing::post, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use minter_core::UnsignedTx;

use crate::handlers::{handle_callback, handle_connect_page, handle_sign_page, handle_tx};
use crate::types::{PendingRequest, RequestStatus};

/// Shared server state
pub struct ServerState {
    /// Port the server is running on
    pub port: u16,
    /// Host used in page URLs
    pub host: String,
    /// Pending requests by ID
    pub pending_requests: RwLock<HashMap<String, PendingRequest>>,
}

impl ServerState {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            port,
            host: host.into(),
            pending_requests: RwLock::new(HashMap::new()),
        }
    }

    /// Base URL the wallet pages call back to
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Drop requests past their lifetime
    pub async fn remove_expired(&self) -> usize {
        let mut requests = self.pending_requests.write().await;
        let before = requests.len();
        requests.retain(|id, req| {
            let expired = req.is_expired();
            if expired {
                tracing::debug!("Cleaning up expired request: {}", id);
            }
            !expired
        });
        before - requests.len()
    }
}

/// Build the bridge router over shared state
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/connect/:id", get(handle_connect_page))
        .route("/sign/:id", get(handle_sign_page))
        .route("/tx/:id", get(handle_tx))
        .route("/callback/:id", post(handle_callback))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Wallet bridge HTTP server
pub struct BridgeServer {
    state: Arc<ServerState>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl BridgeServer {
    /// Start the server on an available port
    pub async fn start() -> Result<Self, std::io::Error> {
        Self::start_on_port(0).await
    }

    /// Start the server on a specific port (0 for auto-assign)
    pub async fn start_on_port(port: u16) -> Result<Self, std::io::Error> {
        // Loopback only: the wallet page runs in a browser on this machine
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        let state = Arc::new(ServerState::new("127.0.0.1", actual_port));
        let app = router(state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            tracing::info!("Wallet bridge starting on port {}", actual_port);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("Wallet bridge shutting down");
                })
                .await
                .ok();
        });

        let cleanup_state = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
                cleanup_state.remove_expired().await;
            }
        });

        Ok(Self {
            state,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn port(&self) -> u16 {
        self.state.port
    }

    /// Create a wallet connect request. Returns (id, page URL).
    pub async fn create_connect_request(&self, chain_id: u64) -> (String, String) {
        let id = generate_request_id();
        let request = PendingRequest::new_connect(id.clone(), chain_id);

        let mut requests = self.state.pending_requests.write().await;
        requests.insert(id.clone(), request);

        let url = format!("{}/connect/{}", self.state.base_url(), id);
        (id, url)
    }

    /// Create a send-transaction request. Returns (id, page URL).
    pub async fn create_tx_request(
        &self,
        unsigned_tx: UnsignedTx,
        message: String,
    ) -> (String, String) {
        let id = generate_request_id();
        let request = PendingRequest::new_send_tx(id.clone(), unsigned_tx, message);

        let mut requests = self.state.pending_requests.write().await;
        requests.insert(id.clone(), request);

        let url = format!("{}/sign/{}", self.state.base_url(), id);
        (id, url)
    }

    /// Get the status of a request
    pub async fn get_request_status(&self, request_id: &str) -> Option<RequestStatus> {
        let mut requests = self.state.pending_requests.write().await;
        let request = requests.get_mut(request_id)?;
        if request.status.is_pending() && request.is_expired() {
            request.status = RequestStatus::Expired;
        }
        Some(request.status.clone())
    }

    /// Poll until the request leaves Pending. Unknown ids report Expired.
    pub async fn wait_for_completion(
        &self,
        request_id: &str,
        poll_interval: Duration,
    ) -> RequestStatus {
        loop {
            match self.get_request_status(request_id).await {
                Some(RequestStatus::Pending) => tokio::time::sleep(poll_interval).await,
                Some(status) => return status,
                None => return RequestStatus::Expired,
            }
        }
    }

    /// Cancel a pending request
    pub async fn cancel_request(&self, request_id: &str) {
        let mut requests = self.state.pending_requests.write().await;
        requests.remove(request_id);
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }
}

impl Drop for BridgeServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Generate a random request ID
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let random: u32 = rand::random();
    format!("{:x}{:08x}", timestamp, random)
}
