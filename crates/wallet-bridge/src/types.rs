//! Wallet bridge request types

use std::time::{Duration, Instant};

use minter_core::UnsignedTx;
use serde::{Deserialize, Serialize};

/// Requests older than this are refused and cleaned up
pub const REQUEST_TTL: Duration = Duration::from_secs(300);

/// EIP-1193 error code for a request the user declined
pub const USER_REJECTED_CODE: i64 = 4001;

/// Payload the wallet page posts back
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCallback {
    /// Selected account (connect requests)
    #[serde(default)]
    pub address: Option<String>,
    /// Broadcast transaction hash (send requests)
    #[serde(default)]
    pub tx_hash: Option<String>,
    /// Provider error message
    #[serde(default)]
    pub error: Option<String>,
    /// EIP-1193 error code, if the provider gave one
    #[serde(default)]
    pub code: Option<i64>,
}

impl WalletCallback {
    pub fn is_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE)
    }
}

/// Type of pending request
#[derive(Debug, Clone)]
pub enum RequestType {
    /// Ask the wallet for an account on `chain_id`
    Connect { chain_id: u64 },
    /// Ask the wallet to sign and broadcast a transaction
    SendTransaction {
        unsigned_tx: UnsignedTx,
        /// Shown on the signing page
        message: String,
    },
}

/// Status of a pending request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for the wallet page
    Pending,
    /// Account received (connect requests)
    AddressReceived(String),
    /// Transaction broadcast by the wallet
    TxSubmitted { tx_hash: String },
    /// User declined in the wallet
    Rejected,
    Expired,
    Failed(String),
}

impl RequestStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// A request waiting on the browser wallet
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: String,
    pub request_type: RequestType,
    pub created_at: Instant,
    pub status: RequestStatus,
}

impl PendingRequest {
    pub fn new_connect(id: String, chain_id: u64) -> Self {
        Self {
            id,
            request_type: RequestType::Connect { chain_id },
            created_at: Instant::now(),
            status: RequestStatus::Pending,
        }
    }

    pub fn new_send_tx(id: String, unsigned_tx: UnsignedTx, message: String) -> Self {
        Self {
            id,
            request_type: RequestType::SendTransaction {
                unsigned_tx,
                message,
            },
            created_at: Instant::now(),
            status: RequestStatus::Pending,
        }
    }

    /// Check if the request has outlived [`REQUEST_TTL`]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > REQUEST_TTL
    }

    /// Apply a wallet callback. Returns the new status, or `None` if the
    /// payload does not fit the request type.
    pub fn apply_callback(&mut self, callback: &WalletCallback) -> Option<RequestStatus> {
        let status = if callback.is_rejection() {
            RequestStatus::Rejected
        } else if let Some(error) = &callback.error {
            RequestStatus::Failed(error.clone())
        } else {
            match &self.request_type {
                RequestType::Connect { .. } => {
                    let address = callback.address.as_ref()?;
                    if !minter_core::Address::new(address.as_str()).is_well_formed() {
                        return None;
                    }
                    RequestStatus::AddressReceived(address.clone())
                }
                RequestType::SendTransaction { .. } => {
                    let tx_hash = callback.tx_hash.as_ref()?;
                    if !minter_core::TxHash::new(tx_hash.as_str()).is_well_formed() {
                        return None;
                    }
                    RequestStatus::TxSubmitted {
                        tx_hash: tx_hash.clone(),
                    }
                }
            }
        };
        self.status = status.clone();
        Some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minter_core::Address;

    const ADDRESS: &str = "0x00000000000000000000000000000000000000aa";

    fn sample_tx() -> UnsignedTx {
        UnsignedTx {
            from: None,
            to: Address::new("0x0000000000000000000000000000000000008004"),
            value: "0x1".to_string(),
            data: "0x".to_string(),
            chain_id: "0x2105".to_string(),
        }
    }

    #[test]
    fn test_expiry() {
        let request = PendingRequest::new_connect("a".to_string(), 8453);
        assert!(!request.is_expired());
        assert!(!request.is_expired_at(request.created_at + Duration::from_secs(300)));
        assert!(request.is_expired_at(request.created_at + Duration::from_secs(301)));
    }

    #[test]
    fn test_connect_callback() {
        let mut request = PendingRequest::new_connect("a".to_string(), 8453);
        let callback = WalletCallback {
            address: Some(ADDRESS.to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.apply_callback(&callback),
            Some(RequestStatus::AddressReceived(ADDRESS.to_string()))
        );
    }

    #[test]
    fn test_connect_callback_rejects_bad_address() {
        let mut request = PendingRequest::new_connect("a".to_string(), 8453);
        let callback = WalletCallback {
            address: Some("0x12".to_string()),
            ..Default::default()
        };
        assert_eq!(request.apply_callback(&callback), None);
        assert_eq!(request.status, RequestStatus::Pending);

        // A tx hash is meaningless for a connect request
        let callback = WalletCallback {
            tx_hash: Some(format!("0x{}", "ab".repeat(32))),
            ..Default::default()
        };
        assert_eq!(request.apply_callback(&callback), None);
    }

    #[test]
    fn test_send_callback_outcomes() {
        let mut request =
            PendingRequest::new_send_tx("b".to_string(), sample_tx(), "Mint".to_string());
        let hash = format!("0x{}", "ab".repeat(32));
        let callback = WalletCallback {
            tx_hash: Some(hash.clone()),
            ..Default::default()
        };
        assert_eq!(
            request.apply_callback(&callback),
            Some(RequestStatus::TxSubmitted { tx_hash: hash })
        );

        let mut request =
            PendingRequest::new_send_tx("c".to_string(), sample_tx(), "Mint".to_string());
        let callback: WalletCallback = serde_json::from_value(serde_json::json!({
            "error": "User rejected the request.",
            "code": 4001
        }))
        .unwrap();
        assert_eq!(
            request.apply_callback(&callback),
            Some(RequestStatus::Rejected)
        );

        let callback: WalletCallback = serde_json::from_value(serde_json::json!({
            "error": "insufficient funds",
            "code": -32000
        }))
        .unwrap();
        assert_eq!(
            request.apply_callback(&callback),
            Some(RequestStatus::Failed("insufficient funds".to_string()))
        );
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(RequestStatus::TxSubmitted {
            tx_hash: "0x1".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "tx_submitted");
        assert_eq!(json["value"]["tx_hash"], "0x1");
        assert_eq!(
            serde_json::to_value(RequestStatus::Pending).unwrap()["status"],
            "pending"
        );
    }
}
