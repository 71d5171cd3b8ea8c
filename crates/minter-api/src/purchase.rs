//! Purchase orchestration for the API.
//!
//! The session lock is held only around state transitions; waiting on the
//! wallet and the chain happens in a background task.

use cat8004::tx_builder::MintSummary;
use cat8004::{MintGateway, PurchaseController};
use serde::{Deserialize, Serialize};

use crate::gateway::BridgeGateway;
use crate::{ApiError, AppState};

/// A purchase handed to the wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseStarted {
    pub request_id: String,
    /// Wallet page the user must open to confirm
    pub sign_url: String,
    pub summary: MintSummary,
}

/// Controller over the live gateway for the configured contract
pub async fn controller(state: &AppState) -> Result<PurchaseController<BridgeGateway>, ApiError> {
    let contract = state.sale_contract().await?;
    let sale = state.sale_params().await;
    let gateway = BridgeGateway::new(state.clone(), contract.clone());
    Ok(PurchaseController::new(gateway, contract, sale))
}

/// Validate, move the session to Submitted and open a signing request.
pub async fn start_purchase(state: &AppState, units: u64) -> Result<PurchaseStarted, ApiError> {
    let controller = controller(state).await?;
    launch_purchase(state, controller, units).await
}

/// Begin a purchase on the shared session and finish it in the background.
///
/// Progress is re-read first so availability checks see fresh counters.
pub async fn launch_purchase<G>(
    state: &AppState,
    controller: PurchaseController<G>,
    units: u64,
) -> Result<PurchaseStarted, ApiError>
where
    G: MintGateway + 'static,
{
    let wallet = state.wallet_address().await;
    let pending = controller
        .begin_purchase(state.session(), wallet.as_ref(), units)
        .await?;

    let task_state = state.clone();
    let request = pending.request.clone();
    tokio::spawn(async move {
        match controller
            .complete_purchase(task_state.session(), &request)
            .await
        {
            Ok(phase) => tracing::debug!(
                request_id = %request.request_id,
                "Purchase settled in phase {}",
                phase.as_str()
            ),
            Err(e) => tracing::error!("Failed to record purchase outcome: {}", e),
        }
    });

    Ok(PurchaseStarted {
        request_id: pending.request.request_id,
        sign_url: pending.request.sign_url,
        summary: pending.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cat8004::{
        BlockReason, Notice, ProgressSource, PurchaseError, PurchasePhase, SaleContract,
        SaleProgress, SigningRequest,
    };
    use evm_rpc_client::{ReceiptStatus, TxReceipt};
    use minter_core::{Address, AppConfig, ProtocolError, TxError, TxHash, UnsignedTx};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use wallet_bridge::RequestStatus;

    const ACCOUNT: &str = "0x00000000000000000000000000000000000000aa";
    const CONTRACT: &str = "0x0000000000000000000000000000000000008004";

    fn offline_state() -> AppState {
        let mut config = AppConfig::default();
        config.rpc.url = "http://127.0.0.1:1".to_string();
        config.sale.contract_address = Some(Address::new(CONTRACT));
        AppState::with_config(config)
    }

    /// Wallet that broadcasts at once and a chain that mines immediately
    struct InstantChain {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl MintGateway for InstantChain {
        async fn read_progress(&self) -> Result<SaleProgress, ProtocolError> {
            let minted = if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
                1000.0
            } else {
                3000.0
            };
            Ok(SaleProgress {
                minted_units: minted,
                total_mintable: 500_000.0,
                available_units: 500_000.0 - minted,
                source: ProgressSource::Chain,
            })
        }

        async fn open_signing(
            &self,
            _tx: &UnsignedTx,
            _message: &str,
        ) -> Result<SigningRequest, TxError> {
            Ok(SigningRequest {
                request_id: "stub".to_string(),
                sign_url: "http://127.0.0.1:9/sign/stub".to_string(),
            })
        }

        async fn await_signature(&self, _request: &SigningRequest) -> Result<TxHash, TxError> {
            Ok(TxHash::new(format!("0x{}", "12".repeat(32))))
        }

        async fn await_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt, TxError> {
            Ok(TxReceipt {
                transaction_hash: tx_hash.clone(),
                block_number: 1,
                status: ReceiptStatus::Success,
                gas_used: 50_000,
            })
        }
    }

    async fn wait_for_phase(state: &AppState, phase: &str) {
        for _ in 0..50 {
            if state.session().lock().await.phase.as_str() == phase {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[tokio::test]
    async fn test_purchase_requires_wallet() {
        let state = offline_state();
        let err = start_purchase(&state, 1000).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Purchase(PurchaseError::Blocked(BlockReason::WalletNotConnected))
        ));
        assert_eq!(state.session().lock().await.phase, PurchasePhase::Idle);
    }

    #[tokio::test]
    async fn test_purchase_without_contract() {
        let state = AppState::new();
        let err = start_purchase(&state, 1000).await.unwrap_err();
        assert!(matches!(err, ApiError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_purchase_runs_to_confirmed_then_idle() {
        let state = offline_state();
        state.set_wallet(Address::new(ACCOUNT)).await.unwrap();
        let controller = PurchaseController::new(
            InstantChain {
                reads: AtomicUsize::new(0),
            },
            SaleContract {
                network: state.network().await,
                address: Address::new(CONTRACT),
            },
            state.sale_params().await,
        );

        let started = launch_purchase(&state, controller, 2000).await.unwrap();
        assert_eq!(started.request_id, "stub");
        assert_eq!(started.summary.units, 2000);

        wait_for_phase(&state, "confirmed").await;
        let mut session = state.session().lock().await;
        assert!(matches!(
            session.phase,
            PurchasePhase::Confirmed { units: 2000, .. }
        ));
        // Counters were re-read after the receipt
        assert_eq!(session.progress.minted_units, 3000.0);
        assert!(matches!(
            session.notice,
            Some(Notice::Success { units: 2000, .. })
        ));

        let window = Duration::from_secs(state.sale_params().await.confirmed_display_secs);
        assert!(session.tick(Instant::now() + window, window));
        assert_eq!(session.phase, PurchasePhase::Idle);
        assert!(session.notice.is_none());
    }

    #[tokio::test]
    async fn test_rejected_purchase_returns_to_idle() {
        let state = offline_state();
        state.set_wallet(Address::new(ACCOUNT)).await.unwrap();

        // Offline reads fall back to the default supply, so 1000 is purchasable
        let started = start_purchase(&state, 1000).await.unwrap();
        assert_eq!(started.summary.units, 1000);
        assert!(started.sign_url.contains(&started.request_id));
        assert_eq!(
            state.session().lock().await.phase,
            PurchasePhase::Submitted { units: 1000 }
        );

        // A second purchase is blocked while the first is in flight
        let err = start_purchase(&state, 10).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Purchase(PurchaseError::Blocked(BlockReason::PurchaseInFlight))
        ));

        let bridge = state.bridge_server().await.unwrap();
        {
            let mut requests = bridge.state().pending_requests.write().await;
            assert_eq!(requests.len(), 1);
            requests.get_mut(&started.request_id).unwrap().status = RequestStatus::Rejected;
        }

        wait_for_phase(&state, "idle").await;
        let session = state.session().lock().await;
        assert_eq!(session.phase, PurchasePhase::Idle);
        assert_eq!(session.notice, Some(Notice::Cancelled));
    }
}
