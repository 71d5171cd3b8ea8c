//! Cat8004 Transaction Builder
//!
//! Builds the unsigned `mint(units)` call handed to the wallet.
//!
//! # Important Notes
//!
//! - `value` must equal the quoted native cost exactly or the contract reverts
//! - Quantities are re-validated against the latest progress before building

use evm_rpc_client::jsonrpc::{encode_data, encode_quantity};
use minter_core::{Address, SaleParams, TxError, UnsignedTx, Wei};
use serde::{Deserialize, Serialize};

use crate::abi;
use crate::calculator::compute_quote;
use crate::constants::{SaleContract, TOKEN_NAME};
use crate::state::SaleProgress;
use crate::workflow::BlockReason;

/// Transaction summary for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintSummary {
    pub action: String,
    pub units: u64,
    pub native_cost_wei: Wei,
    pub native_cost_display: String,
    pub fiat_cost_display: String,
    pub derived_item_count: u64,
}

/// Build result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResult {
    pub unsigned_tx: UnsignedTx,
    pub summary: MintSummary,
}

/// First quantity rule a purchase breaks, if any.
///
/// Sold out is reported ahead of bound checks.
pub fn quantity_block_reason(
    units: u64,
    progress: &SaleProgress,
    sale: &SaleParams,
) -> Option<BlockReason> {
    let available = progress.purchasable_units();
    if available == 0 {
        return Some(BlockReason::SoldOut);
    }
    if units < sale.min_units {
        return Some(BlockReason::BelowMinimum {
            min_units: sale.min_units,
        });
    }
    if units > sale.max_units {
        return Some(BlockReason::AboveMaximum {
            max_units: sale.max_units,
        });
    }
    if units > available {
        return Some(BlockReason::ExceedsAvailable {
            requested: units,
            available,
        });
    }
    None
}

/// Build the payable `mint(units)` transaction.
///
/// `units` must already be validated; the value is the exact quoted wei amount.
pub fn build_mint_tx(
    contract: &SaleContract,
    buyer: Option<&Address>,
    sale: &SaleParams,
    units: u64,
) -> Result<BuildResult, TxError> {
    abi::to_sol_address(&contract.address)?;
    if let Some(buyer) = buyer {
        abi::to_sol_address(buyer)?;
    }
    if units == 0 {
        return Err(TxError::BuildFailed {
            message: "Cannot mint zero units".to_string(),
        });
    }

    let quote = compute_quote(sale, units as i64);
    if quote.requested_units != units {
        return Err(TxError::BuildFailed {
            message: format!(
                "Quantity {} outside sale bounds {}..={}",
                units, sale.min_units, sale.max_units
            ),
        });
    }

    let unsigned_tx = UnsignedTx {
        from: buyer.cloned(),
        to: contract.address.clone(),
        value: encode_quantity(quote.native_cost_wei),
        data: encode_data(&abi::encode_mint(units)),
        chain_id: encode_quantity(contract.network.chain_id() as u128),
    };

    let summary = MintSummary {
        action: format!("Mint {} {}", units, TOKEN_NAME),
        units,
        native_cost_wei: quote.native_cost_wei,
        native_cost_display: quote.native_cost_display(),
        fiat_cost_display: quote.fiat_cost_display(),
        derived_item_count: quote.derived_item_count,
    };

    tracing::debug!(
        units,
        value = %unsigned_tx.value,
        contract = %contract.address,
        "Built mint transaction"
    );

    Ok(BuildResult {
        unsigned_tx,
        summary,
    })
}
