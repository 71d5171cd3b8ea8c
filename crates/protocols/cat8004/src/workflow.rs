//! Purchase workflow
//!
//! Tracks one purchase from request to confirmation:
//!
//! ```text
//! Idle -> Submitted -> Confirming -> Confirmed -> (display window) -> Idle
//!              |             |
//!              |             +-> Failed -> Idle
//!              +-> Idle (rejected in wallet, Cancelled notice)
//! ```
//!
//! All state lives in an explicit [`PurchaseSession`]. The chain and wallet sit
//! behind [`MintGateway`], so the controller runs the same way against a node
//! or a test double.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use evm_rpc_client::TxReceipt;
use minter_core::{Address, ProtocolError, SaleParams, TxError, TxHash, UnsignedTx};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::calculator::{clamp_units, compute_quote, Quote};
use crate::constants::{params, SaleContract, TOKEN_NAME};
use crate::fetch::fallback_progress;
use crate::state::{ProgressSource, SaleProgress};
use crate::tx_builder::{build_mint_tx, quantity_block_reason, BuildResult, MintSummary};

/// Chain and wallet operations the workflow depends on
#[async_trait]
pub trait MintGateway: Send + Sync {
    /// Read current sale progress from the contract
    async fn read_progress(&self) -> Result<SaleProgress, ProtocolError>;

    /// Hand the transaction to the wallet for signing
    async fn open_signing(
        &self,
        tx: &UnsignedTx,
        message: &str,
    ) -> Result<SigningRequest, TxError>;

    /// Resolve once the wallet has broadcast the transaction or refused it
    async fn await_signature(&self, request: &SigningRequest) -> Result<TxHash, TxError>;

    /// Wait until the transaction is mined
    async fn await_receipt(&self, tx_hash: &TxHash) -> Result<TxReceipt, TxError>;
}

/// Lifecycle of the current purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PurchasePhase {
    Idle,
    /// Waiting for the wallet to sign and broadcast
    Submitted { units: u64 },
    /// Broadcast, waiting for a receipt
    Confirming { units: u64, tx_hash: TxHash },
    Confirmed { units: u64, tx_hash: TxHash },
    Failed {
        units: u64,
        tx_hash: Option<TxHash>,
        reason: String,
    },
}

impl PurchasePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitted { .. } => "submitted",
            Self::Confirming { .. } => "confirming",
            Self::Confirmed { .. } => "confirmed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Submitted or Confirming: another purchase must wait
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Submitted { .. } | Self::Confirming { .. })
    }
}

/// User-facing message from the last purchase attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Success { units: u64, tx_hash: TxHash },
    Cancelled,
    Failed {
        reason: String,
        tx_hash: Option<TxHash>,
    },
}

/// Why the purchase button is disabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockReason {
    WalletNotConnected,
    SoldOut,
    ExceedsAvailable { requested: u64, available: u64 },
    BelowMinimum { min_units: u64 },
    AboveMaximum { max_units: u64 },
    PurchaseInFlight,
}

impl BlockReason {
    /// Button text while blocked
    pub fn label(&self) -> String {
        match self {
            Self::WalletNotConnected => "Connect Wallet".to_string(),
            Self::SoldOut => "Sold Out!".to_string(),
            Self::ExceedsAvailable { .. } => "Not Enough Available".to_string(),
            Self::BelowMinimum { min_units } => format!("Minimum {} units", min_units),
            Self::AboveMaximum { max_units } => format!("Maximum {} units", max_units),
            Self::PurchaseInFlight => "Minting...".to_string(),
        }
    }
}

impl From<BlockReason> for ProtocolError {
    fn from(reason: BlockReason) -> Self {
        match reason {
            BlockReason::WalletNotConnected => ProtocolError::WalletNotConnected,
            BlockReason::SoldOut => ProtocolError::SoldOut,
            BlockReason::ExceedsAvailable {
                requested,
                available,
            } => ProtocolError::ExceedsAvailable {
                requested,
                available,
            },
            BlockReason::BelowMinimum { min_units } => ProtocolError::InvalidAmount {
                message: format!("Minimum purchase is {} units", min_units),
            },
            BlockReason::AboveMaximum { max_units } => ProtocolError::InvalidAmount {
                message: format!("Maximum purchase is {} units", max_units),
            },
            BlockReason::PurchaseInFlight => ProtocolError::PurchaseInFlight,
        }
    }
}

/// Why a purchase request did not go through
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("{}", ProtocolError::from(.0.clone()))]
    Blocked(BlockReason),

    #[error(transparent)]
    Build(#[from] TxError),

    #[error("Wallet unavailable: {0}")]
    Wallet(TxError),

    #[error(transparent)]
    State(#[from] ProtocolError),
}

impl PurchaseError {
    pub fn block_reason(&self) -> Option<&BlockReason> {
        match self {
            Self::Blocked(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Result of watching a broadcast transaction
#[derive(Debug, Clone)]
pub enum Confirmation {
    /// Mined successfully. `progress` is `None` when the re-read failed.
    Confirmed {
        receipt: TxReceipt,
        progress: Option<SaleProgress>,
    },
    Failed {
        tx_hash: TxHash,
        reason: String,
    },
}

/// Session-scoped purchase state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseSession {
    pub phase: PurchasePhase,
    pub requested_units: u64,
    pub progress: SaleProgress,
    pub notice: Option<Notice>,
    /// Number of submissions so far; each new attempt bumps it
    pub attempt: u64,
    #[serde(skip)]
    confirmed_at: Option<Instant>,
}

impl PurchaseSession {
    pub fn new(sale: &SaleParams) -> Self {
        Self {
            phase: PurchasePhase::Idle,
            requested_units: clamp_units(sale, params::DEFAULT_UNITS as i64),
            progress: SaleProgress::fallback(sale.default_total_units),
            notice: None,
            attempt: 0,
            confirmed_at: None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase.is_in_flight()
    }

    /// Store a clamped quantity and return it
    pub fn set_requested_units(&mut self, sale: &SaleParams, raw: i64) -> u64 {
        self.requested_units = clamp_units(sale, raw);
        self.requested_units
    }

    /// Quote for the current quantity
    pub fn quote(&self, sale: &SaleParams) -> Quote {
        compute_quote(sale, self.requested_units as i64)
    }

    /// First rule a purchase of `units` would break, if any
    pub fn block_reason(
        &self,
        sale: &SaleParams,
        wallet_connected: bool,
        units: u64,
    ) -> Option<BlockReason> {
        if self.is_in_flight() {
            return Some(BlockReason::PurchaseInFlight);
        }
        if !wallet_connected {
            return Some(BlockReason::WalletNotConnected);
        }
        quantity_block_reason(units, &self.progress, sale)
    }

    /// Block reason for the currently selected quantity
    pub fn submit_block_reason(
        &self,
        sale: &SaleParams,
        wallet_connected: bool,
    ) -> Option<BlockReason> {
        self.block_reason(sale, wallet_connected, self.requested_units)
    }

    /// Purchase button text for the current state
    pub fn button_label(&self, sale: &SaleParams, wallet_connected: bool) -> String {
        match &self.phase {
            PurchasePhase::Submitted { .. } => return "Confirm in Wallet...".to_string(),
            PurchasePhase::Confirming { .. } => return "Minting...".to_string(),
            _ => {}
        }
        match self.submit_block_reason(sale, wallet_connected) {
            Some(reason) => reason.label(),
            None => format!("Mint {} {}", self.requested_units, TOKEN_NAME),
        }
    }

    /// Store a progress read, falling back when it failed
    pub fn apply_progress(
        &mut self,
        read: Result<SaleProgress, ProtocolError>,
        default_total_units: u64,
    ) -> &SaleProgress {
        self.progress = match read {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!("Mint progress read failed, using fallback: {}", e);
                let last_known = match self.progress.source {
                    ProgressSource::Default => None,
                    _ => Some(&self.progress),
                };
                fallback_progress(last_known, default_total_units)
            }
        };
        &self.progress
    }

    /// Idle -> Submitted
    pub fn mark_submitted(&mut self, units: u64) -> Result<(), ProtocolError> {
        if self.is_in_flight() {
            return Err(ProtocolError::PurchaseInFlight);
        }
        self.phase = PurchasePhase::Submitted { units };
        self.attempt += 1;
        self.notice = None;
        self.confirmed_at = None;
        Ok(())
    }

    /// Apply the wallet's answer to a submission.
    ///
    /// Broadcast moves to Confirming, rejection returns to Idle with a
    /// Cancelled notice, any other error fails the purchase.
    pub fn record_submission(
        &mut self,
        result: Result<TxHash, TxError>,
    ) -> Result<(), ProtocolError> {
        let units = match &self.phase {
            PurchasePhase::Submitted { units } => *units,
            other => {
                return Err(ProtocolError::ActionNotAllowed {
                    reason: format!("No submission pending (phase {})", other.as_str()),
                })
            }
        };

        match result {
            Ok(tx_hash) => {
                tracing::info!(units, tx_hash = %tx_hash, "Mint transaction broadcast");
                self.phase = PurchasePhase::Confirming { units, tx_hash };
            }
            Err(TxError::Rejected) => {
                tracing::info!(units, "Mint rejected in wallet");
                self.phase = PurchasePhase::Idle;
                self.notice = Some(Notice::Cancelled);
            }
            Err(e) => {
                tracing::warn!(units, "Mint submission failed: {}", e);
                let reason = e.to_string();
                self.notice = Some(Notice::Failed {
                    reason: reason.clone(),
                    tx_hash: None,
                });
                self.phase = PurchasePhase::Failed {
                    units,
                    tx_hash: None,
                    reason,
                };
            }
        }
        Ok(())
    }

    /// Confirming -> Confirmed | Failed
    pub fn record_confirmation(
        &mut self,
        confirmation: Confirmation,
        default_total_units: u64,
        now: Instant,
    ) -> Result<(), ProtocolError> {
        let units = match &self.phase {
            PurchasePhase::Confirming { units, .. } => *units,
            other => {
                return Err(ProtocolError::ActionNotAllowed {
                    reason: format!("No transaction confirming (phase {})", other.as_str()),
                })
            }
        };

        match confirmation {
            Confirmation::Confirmed { receipt, progress } => {
                let read = progress.ok_or_else(|| ProtocolError::StateUnavailable {
                    reason: "progress re-read failed after confirmation".to_string(),
                });
                self.apply_progress(read, default_total_units);

                let tx_hash = receipt.transaction_hash;
                tracing::info!(
                    units,
                    tx_hash = %tx_hash,
                    block = receipt.block_number,
                    "Mint confirmed"
                );
                self.notice = Some(Notice::Success {
                    units,
                    tx_hash: tx_hash.clone(),
                });
                self.phase = PurchasePhase::Confirmed { units, tx_hash };
                self.confirmed_at = Some(now);
            }
            Confirmation::Failed { tx_hash, reason } => {
                tracing::warn!(units, tx_hash = %tx_hash, "Mint failed: {}", reason);
                self.notice = Some(Notice::Failed {
                    reason: reason.clone(),
                    tx_hash: Some(tx_hash.clone()),
                });
                self.phase = PurchasePhase::Failed {
                    units,
                    tx_hash: Some(tx_hash),
                    reason,
                };
            }
        }
        Ok(())
    }

    /// Expire transient phases.
    ///
    /// Confirmed returns to Idle once `display_window` has passed; Failed
    /// returns to Idle at once (its notice stays). Returns true on change.
    pub fn tick(&mut self, now: Instant, display_window: Duration) -> bool {
        match &self.phase {
            PurchasePhase::Confirmed { .. } => {
                let expired = self
                    .confirmed_at
                    .map_or(true, |at| now.saturating_duration_since(at) >= display_window);
                if expired {
                    self.phase = PurchasePhase::Idle;
                    self.confirmed_at = None;
                    if matches!(self.notice, Some(Notice::Success { .. })) {
                        self.notice = None;
                    }
                }
                expired
            }
            PurchasePhase::Failed { .. } => {
                self.phase = PurchasePhase::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}

/// Wallet page the user acts on for one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
    pub request_id: String,
    pub sign_url: String,
}

/// A purchase handed to the wallet, awaiting the user's answer
#[derive(Debug, Clone)]
pub struct PendingPurchase {
    pub request: SigningRequest,
    pub summary: MintSummary,
}

/// Drives purchases through a [`MintGateway`]
pub struct PurchaseController<G> {
    gateway: G,
    contract: SaleContract,
    sale: SaleParams,
}

impl<G: MintGateway> PurchaseController<G> {
    pub fn new(gateway: G, contract: SaleContract, sale: SaleParams) -> Self {
        Self {
            gateway,
            contract,
            sale,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn sale(&self) -> &SaleParams {
        &self.sale
    }

    /// Confirmed banner duration
    pub fn display_window(&self) -> Duration {
        Duration::from_secs(self.sale.confirmed_display_secs)
    }

    /// Validate and move Idle -> Submitted. Nothing changes when a rule is broken.
    fn prepare_purchase(
        &self,
        session: &mut PurchaseSession,
        wallet: Option<&Address>,
        units: u64,
    ) -> Result<BuildResult, PurchaseError> {
        if let Some(reason) = session.block_reason(&self.sale, wallet.is_some(), units) {
            tracing::debug!(units, ?reason, "Purchase blocked");
            return Err(PurchaseError::Blocked(reason));
        }

        let build = build_mint_tx(&self.contract, wallet, &self.sale, units).map_err(|e| {
            tracing::error!("Failed to build mint transaction: {}", e);
            e
        })?;

        session.mark_submitted(units)?;
        tracing::info!(units, value = %build.unsigned_tx.value, "Purchase submitted to wallet");
        Ok(build)
    }

    /// Re-read progress, move the session to Submitted and open the wallet request.
    ///
    /// The session lock is held only for the transition. If the wallet
    /// request cannot be opened the attempt is recorded as failed.
    pub async fn begin_purchase(
        &self,
        session: &Mutex<PurchaseSession>,
        wallet: Option<&Address>,
        units: u64,
    ) -> Result<PendingPurchase, PurchaseError> {
        let read = self.gateway.read_progress().await;

        let build = {
            let mut session = session.lock().await;
            session.tick(Instant::now(), self.display_window());
            if !session.is_in_flight() {
                session.apply_progress(read, self.sale.default_total_units);
            }
            self.prepare_purchase(&mut session, wallet, units)?
        };

        match self
            .gateway
            .open_signing(&build.unsigned_tx, &build.summary.action)
            .await
        {
            Ok(request) => {
                tracing::info!(units, request_id = %request.request_id, "Signing request opened");
                Ok(PendingPurchase {
                    request,
                    summary: build.summary,
                })
            }
            Err(e) => {
                let message = e.to_string();
                session
                    .lock()
                    .await
                    .record_submission(Err(TxError::SubmissionFailed { message }))?;
                Err(PurchaseError::Wallet(e))
            }
        }
    }

    /// Wait for the receipt; re-read progress on success
    pub async fn observe(&self, tx_hash: &TxHash) -> Confirmation {
        match self.gateway.await_receipt(tx_hash).await {
            Ok(receipt) if receipt.succeeded() => {
                let progress = match self.gateway.read_progress().await {
                    Ok(progress) => Some(progress),
                    Err(e) => {
                        tracing::warn!("Progress re-read after mint failed: {}", e);
                        None
                    }
                };
                Confirmation::Confirmed { receipt, progress }
            }
            Ok(receipt) => Confirmation::Failed {
                tx_hash: receipt.transaction_hash,
                reason: "Transaction reverted".to_string(),
            },
            Err(e) => Confirmation::Failed {
                tx_hash: tx_hash.clone(),
                reason: e.to_string(),
            },
        }
    }

    /// Record the wallet's answer and, once broadcast, the confirmation.
    ///
    /// Returns the phase reached: Idle (cancelled), Confirmed or Failed.
    pub async fn complete_purchase(
        &self,
        session: &Mutex<PurchaseSession>,
        request: &SigningRequest,
    ) -> Result<PurchasePhase, ProtocolError> {
        let submitted = self.gateway.await_signature(request).await;
        let tx_hash = {
            let mut session = session.lock().await;
            let tx_hash = submitted.as_ref().ok().cloned();
            session.record_submission(submitted)?;
            match tx_hash {
                Some(tx_hash) => tx_hash,
                None => return Ok(session.phase.clone()),
            }
        };

        let confirmation = self.observe(&tx_hash).await;
        let mut session = session.lock().await;
        session.record_confirmation(
            confirmation,
            self.sale.default_total_units,
            Instant::now(),
        )?;
        Ok(session.phase.clone())
    }
}
