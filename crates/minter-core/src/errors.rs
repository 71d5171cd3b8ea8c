//! Error types for the minter

use thiserror::Error;

/// Core errors that can occur in the minter
#[derive(Debug, Error)]
pub enum Error {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// RPC connection and query errors
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC endpoint unreachable at {url}")]
    Unreachable { url: String },

    #[error("RPC returned error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("RPC request failed: {message}")]
    ApiError { message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Call reverted: {reason}")]
    Reverted { reason: String },

    #[error("Chain id mismatch: expected {expected}, node reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Contract not configured for {network}")]
    NetworkNotSupported { network: String },

    #[error("Sale state unavailable: {reason}")]
    StateUnavailable { reason: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Action not allowed: {reason}")]
    ActionNotAllowed { reason: String },

    #[error("Sold out")]
    SoldOut,

    #[error("Not enough available: requested {requested}, available {available}")]
    ExceedsAvailable { requested: u64, available: u64 },

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("A purchase is already in progress")]
    PurchaseInFlight,

    #[error("Failed to decode contract data: {message}")]
    DecodeError { message: String },
}

/// Transaction building and submission errors
#[derive(Debug, Error)]
pub enum TxError {
    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Failed to build transaction: {message}")]
    BuildFailed { message: String },

    #[error("Transaction rejected in wallet")]
    Rejected,

    #[error("Transaction submission failed: {message}")]
    SubmissionFailed { message: String },

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Transaction {tx_hash} dropped")]
    Dropped { tx_hash: String },

    #[error("Transaction {tx_hash} not confirmed after {waited_secs}s")]
    ConfirmationTimeout { tx_hash: String, waited_secs: u64 },
}

/// Result type alias for minter operations
pub type Result<T> = std::result::Result<T, Error>;

impl ProtocolError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NetworkNotSupported { .. } => "network_not_supported",
            Self::StateUnavailable { .. } => "state_unavailable",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::ActionNotAllowed { .. } => "action_not_allowed",
            Self::SoldOut => "sold_out",
            Self::ExceedsAvailable { .. } => "exceeds_available",
            Self::WalletNotConnected => "wallet_not_connected",
            Self::PurchaseInFlight => "purchase_in_flight",
            Self::DecodeError { .. } => "decode_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } | Self::InvalidAddress { .. } => 400,
            Self::SoldOut | Self::ExceedsAvailable { .. } => 422,
            Self::ActionNotAllowed { .. } | Self::NetworkNotSupported { .. } => 422,
            Self::WalletNotConnected => 401,
            Self::PurchaseInFlight => 409,
            Self::StateUnavailable { .. } | Self::DecodeError { .. } => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_codes() {
        let err = ProtocolError::InvalidAmount {
            message: "test".into(),
        };
        assert_eq!(err.error_code(), "invalid_amount");
        assert_eq!(err.status_code(), 400);

        let err = ProtocolError::ExceedsAvailable {
            requested: 100,
            available: 50,
        };
        assert_eq!(err.error_code(), "exceeds_available");
        assert_eq!(err.status_code(), 422);

        assert_eq!(ProtocolError::PurchaseInFlight.status_code(), 409);
        assert_eq!(ProtocolError::SoldOut.to_string(), "Sold out");
    }

    #[test]
    fn test_error_wraps_layers() {
        let err: Error = TxError::Rejected.into();
        assert_eq!(
            err.to_string(),
            "Transaction error: Transaction rejected in wallet"
        );
    }
}
