//! minter-api: HTTP API layer for the minter
//!
//! Provides a RESTful API for the frontend: quotes, sale progress, wallet
//! connection and the purchase workflow.

pub mod dto;
pub mod gateway;
pub mod purchase;
pub mod routes;
pub mod server;
pub mod state;

pub use gateway::BridgeGateway;
pub use purchase::{start_purchase, PurchaseStarted};
pub use server::*;
pub use state::{ApiError, AppState, WalletState};
