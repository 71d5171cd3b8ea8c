//! Transaction receipt parsing

use minter_core::{RpcError, TxHash};
use serde::{Deserialize, Serialize};

use crate::jsonrpc::parse_quantity;

/// Execution outcome recorded in a receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Mined transaction receipt (only the fields the minter reads)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub status: ReceiptStatus,
    pub gas_used: u64,
}

impl TxReceipt {
    /// Parse the JSON object returned by `eth_getTransactionReceipt`
    pub fn from_json(json: &serde_json::Value) -> Result<Self, RpcError> {
        let field = |name: &str| {
            json[name]
                .as_str()
                .ok_or_else(|| RpcError::ParseError(format!("Receipt missing {}", name)))
        };

        let transaction_hash = TxHash::new(field("transactionHash")?);
        let block_number = parse_quantity(field("blockNumber")?)?;
        let gas_used = parse_quantity(field("gasUsed")?)?;

        // Post-Byzantium receipts carry status 0x1 / 0x0
        let status = match parse_quantity(field("status")?)? {
            1 => ReceiptStatus::Success,
            _ => ReceiptStatus::Reverted,
        };

        Ok(Self {
            transaction_hash,
            block_number,
            status,
            gas_used,
        })
    }

    pub fn succeeded(&self) -> bool {
        self.status == ReceiptStatus::Success
    }

    /// Confirmations at `head`, counting the inclusion block as one
    pub fn confirmations(&self, head: u64) -> u64 {
        head.saturating_sub(self.block_number) + 1
    }
}
