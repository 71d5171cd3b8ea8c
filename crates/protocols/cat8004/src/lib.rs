//! Cat8004 Sale Implementation
//!
//! This crate implements the client side of the Cat8004 token sale on Base.
//!
//! # Sale Overview
//!
//! Buyers call the contract's payable `mint(units)` with value equal to a fixed
//! linear price (0.0025 ETH per 1000 units). Every 1000 units accumulated by an
//! address earns one collectible, minted by the contract itself.
//!
//! # Features
//!
//! - Quote calculation (native and fiat cost, derived collectible count)
//! - Sale progress and account reads via `eth_call`
//! - Unsigned `mint` transaction building
//! - Purchase workflow over an explicit session state
//!
//! # Example
//!
//! ```ignore
//! use cat8004::{compute_quote, fetch_mint_progress};
//!
//! let quote = compute_quote(&config.sale.params, 1000);
//! println!("{} ETH", quote.native_cost_display());
//! let progress = fetch_mint_progress(&rpc_client, &contract).await?;
//! println!("{:.1}% minted", progress.progress_pct());
//! ```

pub mod abi;
pub mod calculator;
pub mod constants;
pub mod fetch;
pub mod state;
pub mod tx_builder;
pub mod workflow;

pub use calculator::*;
pub use constants::*;
pub use fetch::{
    fetch_account_snapshot, fetch_distribution_count, fetch_mint_progress,
    fetch_progress_or_fallback,
};
pub use state::*;
pub use workflow::{
    BlockReason, Confirmation, MintGateway, Notice, PendingPurchase, PurchaseController,
    PurchaseError, PurchasePhase, PurchaseSession, SigningRequest,
};
