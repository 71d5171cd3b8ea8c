//! evm-rpc-client: JSON-RPC client for EVM nodes with capability detection
//!
//! This crate provides a high-level client for the handful of read methods the
//! minter needs, plus endpoint probing so callers can degrade gracefully when
//! the RPC is down or pointed at the wrong chain.

pub mod capabilities;
pub mod jsonrpc;
pub mod receipt;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use minter_core::{Address, BlockNumber, RpcConfig, RpcError, TxHash};
use tokio::sync::RwLock;

use crate::jsonrpc::{decode_data, encode_data, parse_quantity, JsonRpcRequest, JsonRpcResponse};

/// Default timeout for RPC calls (30 seconds).
const RPC_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub use capabilities::{CapabilityTier, RpcCapabilities};
pub use receipt::{ReceiptStatus, TxReceipt};

/// Result type for RPC client operations
pub type Result<T> = std::result::Result<T, RpcError>;

/// Lookup state of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxLookup {
    /// Mined, with receipt
    Mined(TxReceipt),
    /// Known to the node but not yet in a block
    Pending,
    /// Unknown to the node
    NotFound,
}

/// High-level EVM RPC client with capability detection
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    capabilities: Arc<RwLock<Option<RpcCapabilities>>>,
    next_id: Arc<AtomicU64>,
    config: RpcConfig,
    expected_chain_id: u64,
}

impl RpcClient {
    /// Create a new client and probe the endpoint
    pub async fn new(config: RpcConfig, expected_chain_id: u64) -> Result<Self> {
        let client = Self::new_without_probe(config, expected_chain_id)?;

        client.refresh_capabilities().await;

        let caps = client.capabilities().await;
        if !caps.as_ref().is_some_and(|c| c.is_online) {
            return Err(RpcError::Unreachable {
                url: client.config.url.clone(),
            });
        }

        Ok(client)
    }

    /// Create without probing (for testing or when the endpoint may be offline)
    pub fn new_without_probe(config: RpcConfig, expected_chain_id: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(RPC_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Unreachable {
                url: format!("{}: {}", config.url, e),
            })?;

        Ok(Self {
            http,
            capabilities: Arc::new(RwLock::new(None)),
            next_id: Arc::new(AtomicU64::new(1)),
            config,
            expected_chain_id,
        })
    }

    /// Get the current RPC configuration
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.expected_chain_id
    }

    /// Refresh capability detection
    pub async fn refresh_capabilities(&self) {
        let caps = capabilities::detect_capabilities(self, self.expected_chain_id).await;
        let mut lock = self.capabilities.write().await;
        *lock = Some(caps);
    }

    /// Get current capabilities (may be stale if not recently refreshed)
    pub async fn capabilities(&self) -> Option<RpcCapabilities> {
        let lock = self.capabilities.read().await;
        lock.clone()
    }

    /// Send a raw JSON-RPC request and return the `result` value
    pub async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest::new(id, method, params);

        tracing::trace!(method, id, "RPC request");

        let response = timed_request(self.http.post(&self.config.url).json(&body).send())
            .await?
            .error_for_status()
            .map_err(|e| RpcError::ApiError {
                message: e.to_string(),
            })?;

        let envelope: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::ParseError(format!("{} response: {}", method, e)))?;

        envelope.into_result()
    }

    /// `eth_chainId`
    pub async fn chain_id(&self) -> Result<u64> {
        let value = self.request("eth_chainId", serde_json::json!([])).await?;
        parse_quantity(as_str(&value, "eth_chainId")?)
    }

    /// `eth_blockNumber`
    pub async fn block_number(&self) -> Result<BlockNumber> {
        let value = self.request("eth_blockNumber", serde_json::json!([])).await?;
        parse_quantity(as_str(&value, "eth_blockNumber")?)
    }

    /// Check if the endpoint is reachable
    pub async fn is_online(&self) -> bool {
        self.block_number().await.is_ok()
    }

    /// `eth_call` against the latest block, returning raw return data
    pub async fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>> {
        let params = serde_json::json!([
            { "to": to.as_str(), "data": encode_data(data) },
            "latest"
        ]);
        let value = self.request("eth_call", params).await?;
        decode_data(as_str(&value, "eth_call")?)
    }

    /// `eth_getTransactionReceipt`. `None` while the transaction is unmined.
    pub async fn transaction_receipt(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>> {
        let value = self
            .request(
                "eth_getTransactionReceipt",
                serde_json::json!([tx_hash.as_str()]),
            )
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        TxReceipt::from_json(&value).map(Some)
    }

    /// `eth_getTransactionByHash` as raw JSON. `None` if unknown to the node.
    pub async fn transaction_by_hash(&self, tx_hash: &TxHash) -> Result<Option<serde_json::Value>> {
        let value = self
            .request(
                "eth_getTransactionByHash",
                serde_json::json!([tx_hash.as_str()]),
            )
            .await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    /// Combine receipt and mempool lookups into one status
    pub async fn lookup_transaction(&self, tx_hash: &TxHash) -> Result<TxLookup> {
        if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
            return Ok(TxLookup::Mined(receipt));
        }
        match self.transaction_by_hash(tx_hash).await? {
            Some(_) => Ok(TxLookup::Pending),
            None => Ok(TxLookup::NotFound),
        }
    }
}

/// Result of probing a single RPC URL
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RpcProbeResult {
    pub url: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub latency_ms: u64,
}

/// Probe a single RPC URL. Returns None on failure (timeout/unreachable).
/// Uses a 4-second timeout.
pub async fn probe_rpc(url: &str) -> Option<RpcProbeResult> {
    let start = std::time::Instant::now();
    let client = RpcClient::new_without_probe(RpcConfig { url: url.to_string() }, 0).ok()?;

    let chain_id = tokio::time::timeout(std::time::Duration::from_secs(4), client.chain_id())
        .await
        .ok()?
        .ok()?;
    let block_number =
        tokio::time::timeout(std::time::Duration::from_secs(4), client.block_number())
            .await
            .ok()?
            .ok()?;

    Some(RpcProbeResult {
        url: url.to_string(),
        chain_id,
        block_number,
        latency_ms: start.elapsed().as_millis() as u64,
    })
}

fn as_str<'a>(value: &'a serde_json::Value, method: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| RpcError::ParseError(format!("{} returned non-string result", method)))
}

/// Wrap an HTTP call with a timeout. Converts both timeout and transport errors to RpcError.
async fn timed_request<T>(
    fut: impl std::future::Future<Output = std::result::Result<T, reqwest::Error>>,
) -> Result<T> {
    tokio::time::timeout(RPC_REQUEST_TIMEOUT, fut)
        .await
        .map_err(|_| RpcError::ApiError {
            message: format!(
                "RPC request timed out after {}s",
                RPC_REQUEST_TIMEOUT.as_secs()
            ),
        })?
        .map_err(|e| RpcError::ApiError {
            message: e.to_string(),
        })
}
