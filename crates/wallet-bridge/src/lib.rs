//! Wallet bridge for browser wallet integration
//!
//! Serves connect and signing pages that talk to an injected EIP-1193
//! provider, and records what the wallet answered.

pub mod handlers;
pub mod pages;
pub mod server;
pub mod types;

pub use server::BridgeServer;
pub use types::*;
