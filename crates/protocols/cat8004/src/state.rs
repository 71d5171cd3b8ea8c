//! Cat8004 Sale State
//!
//! Sale progress and account reads decoded from the contract's 1e18-scaled counters.

use alloy_primitives::U256;
use minter_core::constants::TOKEN_SCALE;
use minter_core::Address;
use serde::{Deserialize, Serialize};

use crate::abi::RawMintProgress;

/// Where a progress snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSource {
    /// Fresh contract read
    Chain,
    /// Previous successful read, reused after a failed refresh
    LastKnown,
    /// Configured defaults, no read has succeeded yet
    Default,
}

/// Sale progress for API responses
///
/// `minted_units + available_units == total_mintable` is maintained by the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleProgress {
    pub minted_units: f64,
    pub total_mintable: f64,
    pub available_units: f64,
    pub source: ProgressSource,
}

impl SaleProgress {
    /// Build from raw contract counters
    pub fn from_raw(raw: &RawMintProgress) -> Self {
        Self {
            minted_units: scaled_to_units(raw.minted),
            total_mintable: scaled_to_units(raw.total),
            available_units: scaled_to_units(raw.available),
            source: ProgressSource::Chain,
        }
    }

    /// Defaults shown before any read succeeds: nothing minted, everything available
    pub fn fallback(default_total_units: u64) -> Self {
        Self {
            minted_units: 0.0,
            total_mintable: default_total_units as f64,
            available_units: default_total_units as f64,
            source: ProgressSource::Default,
        }
    }

    /// Same counters, marked as reused after a failed refresh
    pub fn as_last_known(&self) -> Self {
        Self {
            source: ProgressSource::LastKnown,
            ..self.clone()
        }
    }

    /// Minted share of total supply, 0 when total is 0
    pub fn progress_pct(&self) -> f64 {
        if self.total_mintable <= 0.0 {
            return 0.0;
        }
        self.minted_units / self.total_mintable * 100.0
    }

    pub fn remaining_pct(&self) -> f64 {
        if self.total_mintable <= 0.0 {
            return 0.0;
        }
        self.available_units / self.total_mintable * 100.0
    }

    /// Whole units that can still be bought
    pub fn purchasable_units(&self) -> u64 {
        if self.available_units <= 0.0 {
            0
        } else {
            self.available_units.floor() as u64
        }
    }

    pub fn is_sold_out(&self) -> bool {
        self.purchasable_units() == 0
    }
}

/// Holdings of one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub address: Address,
    /// Token balance in whole units
    pub token_balance: f64,
    /// Raw 1e18-scaled balance as a decimal string
    pub token_balance_raw: String,
    /// Collectibles owed to this address
    pub expected_nft_count: u64,
}

/// Convert a 1e18-scaled counter to decimal units
pub fn scaled_to_units(raw: U256) -> f64 {
    let scale = U256::from(TOKEN_SCALE);
    let whole: u128 = (raw / scale).saturating_to();
    let frac: u128 = (raw % scale).saturating_to();
    whole as f64 + frac as f64 / TOKEN_SCALE as f64
}

/// Plain counters (NFT count, distribution count) saturated into u64
pub fn count_to_u64(raw: U256) -> u64 {
    raw.saturating_to()
}
