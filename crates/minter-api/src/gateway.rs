//! Live [`MintGateway`]: contract reads over RPC, submission through the
//! wallet bridge, and receipt polling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cat8004::{fetch_mint_progress, MintGateway, SaleContract, SaleProgress, SigningRequest};
use evm_rpc_client::{TxLookup, TxReceipt};
use minter_core::{ProtocolError, TxError, TxHash, UnsignedTx};
use wallet_bridge::{BridgeServer, RequestStatus};

use crate::AppState;

/// How often the wallet bridge is checked for an answer
pub const WALLET_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Receipt polling schedule
#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolicy {
    pub poll_interval: Duration,
    /// Give up waiting after this long
    pub timeout: Duration,
    /// A hash the node has never seen for this long is treated as dropped
    pub drop_grace: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(40 * 60),
            drop_grace: Duration::from_secs(5 * 60),
        }
    }
}

/// Wait for the bridge request to leave Pending and map the outcome
pub async fn await_wallet_tx(bridge: &BridgeServer, request_id: &str) -> Result<TxHash, TxError> {
    match bridge
        .wait_for_completion(request_id, WALLET_POLL_INTERVAL)
        .await
    {
        RequestStatus::TxSubmitted { tx_hash } => Ok(TxHash::new(tx_hash)),
        RequestStatus::Rejected => Err(TxError::Rejected),
        RequestStatus::Expired => Err(TxError::SubmissionFailed {
            message: "Wallet request expired".to_string(),
        }),
        RequestStatus::Failed(message) => Err(TxError::SubmissionFailed { message }),
        other => Err(TxError::SubmissionFailed {
            message: format!("Unexpected wallet answer: {:?}", other),
        }),
    }
}

/// Poll until `tx_hash` is mined, dropped or the policy times out.
///
/// RPC errors are logged and retried; the endpoint may come back.
pub async fn wait_for_receipt(
    state: &AppState,
    tx_hash: &TxHash,
    policy: ReceiptPolicy,
) -> Result<TxReceipt, TxError> {
    let started = Instant::now();
    let mut seen = false;

    loop {
        if let Some(client) = state.rpc_client().await {
            match client.lookup_transaction(tx_hash).await {
                Ok(TxLookup::Mined(receipt)) => {
                    tracing::debug!(
                        tx_hash = %tx_hash,
                        block = receipt.block_number,
                        "Receipt found"
                    );
                    return Ok(receipt);
                }
                Ok(TxLookup::Pending) => seen = true,
                Ok(TxLookup::NotFound) => {
                    if !seen && started.elapsed() >= policy.drop_grace {
                        tracing::warn!(
                            tx_hash = %tx_hash,
                            "Transaction unknown to node, treating as dropped"
                        );
                        return Err(TxError::Dropped {
                            tx_hash: tx_hash.to_string(),
                        });
                    }
                }
                Err(e) => tracing::warn!(tx_hash = %tx_hash, "Receipt lookup failed: {}", e),
            }
        }

        if started.elapsed() >= policy.timeout {
            return Err(TxError::ConfirmationTimeout {
                tx_hash: tx_hash.to_string(),
                waited_secs: started.elapsed().as_secs(),
            });
        }
        tokio::time::sleep(policy.poll_interval).await;
    }
}

/// Gateway backed by the shared app state
#[derive(Clone)]
pub struct BridgeGateway {
    state: AppState,
    contract: SaleContract,
    policy: ReceiptPolicy,
}

impl BridgeGateway {
    pub fn new(state: AppState, contract: SaleContract) -> Self {
        Self {
            state,
            contract,
            policy: ReceiptPolicy::default(),
        }
    }

    async fn bridge(&self) -> Result<Arc<BridgeServer>, TxError> {
        self.state
            .bridge_server()
            .await
            .map_err(|e| TxError::SubmissionFailed {
                message: format!("Wallet bridge unavailable: {}", e),
            })
    }
}

#[async_trait]
impl MintGateway for BridgeGateway {
    async fn read_progress(&self) -> Result<SaleProgress, ProtocolError> {
        let client = self.state.rpc_client().await.ok_or_else(|| {
            ProtocolError::StateUnavailable {
                reason: "RPC endpoint unreachable".to_string(),
            }
        })?;
        fetch_mint_progress(&client, &self.contract.address).await
    }

    async fn open_signing(
        &self,
        tx: &UnsignedTx,
        message: &str,
    ) -> Result<SigningRequest, TxError> {
        let bridge = self.bridge().await?;
        let (request_id, sign_url) = bridge
            .create_tx_request(tx.clone(), message.to_string())
            .await;
        Ok(SigningRequest {
            request_id,
            sign_url,
        })
    }

    async fn await_signature(&self, request: &SigningRequest) -> Result<TxHash, TxError> {
        let bridge = self.bridge().await?;
        await_wallet_tx(&bridge, &request.request_id).await
    }

    async fn await_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt, TxError> {
        wait_for_receipt(&self.state, tx_hash, self.policy).await
    }
}
