//! Configuration types for the minter

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Address, Error, Network};

/// RPC connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint (e.g., "https://mainnet.base.org")
    pub url: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: Network::Base.default_rpc_url().to_string(),
        }
    }
}

/// Fixed sale schedule. Mirrors the contract's own bounds and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleParams {
    /// Smallest purchasable quantity
    #[serde(default = "defaults::min_units")]
    pub min_units: u64,

    /// Largest quantity per purchase
    #[serde(default = "defaults::max_units")]
    pub max_units: u64,

    /// Native cost of 1000 units, in wei (0.0025 ETH)
    #[serde(default = "defaults::rate_wei_per_thousand")]
    pub rate_wei_per_thousand: u64,

    /// Reference fiat cost of 1000 units, in cents ($10.00)
    #[serde(default = "defaults::fiat_cents_per_thousand")]
    pub fiat_cents_per_thousand: u64,

    /// Units per derived collectible
    #[serde(default = "defaults::items_per_bundle")]
    pub items_per_bundle: u64,

    /// How long a confirmed purchase stays on screen (seconds)
    #[serde(default = "defaults::confirmed_display_secs")]
    pub confirmed_display_secs: u64,

    /// Total mintable supply shown when the progress read fails
    #[serde(default = "defaults::default_total_units")]
    pub default_total_units: u64,
}

impl Default for SaleParams {
    fn default() -> Self {
        Self {
            min_units: defaults::min_units(),
            max_units: defaults::max_units(),
            rate_wei_per_thousand: defaults::rate_wei_per_thousand(),
            fiat_cents_per_thousand: defaults::fiat_cents_per_thousand(),
            items_per_bundle: defaults::items_per_bundle(),
            confirmed_display_secs: defaults::confirmed_display_secs(),
            default_total_units: defaults::default_total_units(),
        }
    }
}

/// Sale contract settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Deployed token contract
    #[serde(default)]
    pub contract_address: Option<Address>,

    #[serde(default)]
    pub params: SaleParams,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// RPC connection settings
    #[serde(default)]
    pub rpc: RpcConfig,

    /// Network (Base or Base Sepolia)
    pub network: Network,

    /// API server port
    #[serde(default = "defaults::api_port")]
    pub api_port: u16,

    /// Wallet bridge port (0 picks a free port)
    #[serde(default)]
    pub bridge_port: u16,

    #[serde(default)]
    pub sale: SaleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            network: Network::Base,
            api_port: defaults::api_port(),
            bridge_port: 0,
            sale: SaleConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            Error::Serialization(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), Error> {
        let params = &self.sale.params;
        if params.min_units == 0 || params.min_units > params.max_units {
            return Err(Error::Config(format!(
                "Invalid unit bounds: min {} max {}",
                params.min_units, params.max_units
            )));
        }
        if params.items_per_bundle == 0 {
            return Err(Error::Config("items_per_bundle must be positive".to_string()));
        }
        if let Some(addr) = &self.sale.contract_address {
            if !addr.is_well_formed() {
                return Err(Error::Config(format!("Invalid contract address: {}", addr)));
            }
        }
        Ok(())
    }
}

mod defaults {
    pub fn min_units() -> u64 {
        1
    }

    pub fn max_units() -> u64 {
        5000
    }

    pub fn rate_wei_per_thousand() -> u64 {
        2_500_000_000_000_000
    }

    pub fn fiat_cents_per_thousand() -> u64 {
        1000
    }

    pub fn items_per_bundle() -> u64 {
        1000
    }

    pub fn confirmed_display_secs() -> u64 {
        5
    }

    pub fn default_total_units() -> u64 {
        500_000
    }

    pub fn api_port() -> u16 {
        18453
    }
}
