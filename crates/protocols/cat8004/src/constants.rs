//! Cat8004 Sale Constants
//!
//! Contract addresses and the fixed sale schedule.

use minter_core::{Address, Network, SaleConfig, SaleParams};

/// Sale schedule. Mirrors the bounds and price enforced by the contract.
pub mod params {
    /// Smallest purchasable quantity
    pub const MIN_UNITS: u64 = 1;

    /// Largest quantity per purchase
    pub const MAX_UNITS: u64 = 5000;

    /// Native cost of 1000 units in wei (0.0025 ETH)
    pub const RATE_WEI_PER_THOUSAND: u64 = 2_500_000_000_000_000;

    /// Reference fiat cost of 1000 units in cents ($10.00)
    pub const FIAT_CENTS_PER_THOUSAND: u64 = 1000;

    /// Units that earn one derived collectible
    pub const ITEMS_PER_BUNDLE: u64 = 1000;

    /// Seconds the success banner stays up after confirmation
    pub const CONFIRMED_DISPLAY_SECS: u64 = 5;

    /// Total supply shown when the progress read fails
    pub const DEFAULT_TOTAL_UNITS: u64 = 500_000;

    /// Native cost shown with 7 decimals (exact for every quotable quantity)
    pub const NATIVE_DISPLAY_DECIMALS: u32 = 7;

    /// Quantity preselected when a session starts
    pub const DEFAULT_UNITS: u64 = 100;

    /// Stepper increment
    pub const STEP_UNITS: u64 = 10;
}

/// Quick-select buttons, capped at availability when applied
pub const QUICK_SELECT_UNITS: [u64; 5] = [1, 10, 100, 1000, 5000];

/// Quantities listed in the reference price table
pub const PRICE_BREAKDOWN_UNITS: [u64; 6] = [1, 100, 500, 1000, 2500, 5000];

/// Token metadata
pub const TOKEN_NAME: &str = "Cat8004";
pub const TOKEN_SYMBOL: &str = "CAT";

/// Sale contract deployment for a network
#[derive(Debug, Clone)]
pub struct SaleContract {
    pub network: Network,
    pub address: Address,
}

impl SaleContract {
    /// Resolve the contract for a network from configuration.
    ///
    /// Returns `None` when no address is configured.
    pub fn for_network(network: Network, config: &SaleConfig) -> Option<Self> {
        let address = config.contract_address.clone()?;
        Some(Self { network, address })
    }
}

/// Schedule matching the deployed contract
pub fn default_params() -> SaleParams {
    SaleParams {
        min_units: params::MIN_UNITS,
        max_units: params::MAX_UNITS,
        rate_wei_per_thousand: params::RATE_WEI_PER_THOUSAND,
        fiat_cents_per_thousand: params::FIAT_CENTS_PER_THOUSAND,
        items_per_bundle: params::ITEMS_PER_BUNDLE,
        confirmed_display_secs: params::CONFIRMED_DISPLAY_SECS,
        default_total_units: params::DEFAULT_TOTAL_UNITS,
    }
}
