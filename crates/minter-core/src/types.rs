//! Core type definitions for the minter

use serde::{Deserialize, Serialize};
use std::fmt;

/// EVM account or contract address (20 bytes, `0x`-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the `0x` prefix and that the body decodes to exactly 20 bytes.
    ///
    /// Mixed-case checksums are accepted but not verified.
    pub fn is_well_formed(&self) -> bool {
        match self.0.strip_prefix("0x") {
            Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
            None => false,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash (32 bytes, `0x`-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_well_formed(&self) -> bool {
        match self.0.strip_prefix("0x") {
            Some(body) => body.len() == 64 && hex::decode(body).is_ok(),
            None => false,
        }
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    /// Base mainnet
    Base,
    /// Base Sepolia testnet
    BaseSepolia,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::BaseSepolia => "base_sepolia",
        }
    }

    /// EIP-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Base => 8453,
            Self::BaseSepolia => 84532,
        }
    }

    /// Public RPC endpoint used when nothing else is configured
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Base => "https://mainnet.base.org",
            Self::BaseSepolia => "https://sepolia.base.org",
        }
    }

    /// Block explorer base URL
    pub fn explorer_url(&self) -> &'static str {
        match self {
            Self::Base => "https://basescan.org",
            Self::BaseSepolia => "https://sepolia.basescan.org",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            8453 => Some(Self::Base),
            84532 => Some(Self::BaseSepolia),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unsigned transaction in the shape wallets accept for `eth_sendTransaction`.
///
/// Quantities are `0x`-prefixed hex strings, as EIP-1193 providers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub value: String,
    pub data: String,
    pub chain_id: String,
}

/// Block number
pub type BlockNumber = u64;

/// Wei amount (1 ETH = 10^18 wei)
pub type Wei = u128;

/// Constants
pub mod constants {
    use super::Wei;

    /// 1 ETH in wei
    pub const WEI_PER_ETH: Wei = 1_000_000_000_000_000_000;

    /// Scale of the token's fixed-point counters (18 decimals)
    pub const TOKEN_SCALE: u128 = 1_000_000_000_000_000_000;
}

/// Format a wei amount as a decimal ETH string with `decimals` fractional digits.
///
/// Rounds half up at the last kept digit.
pub fn format_eth(wei: Wei, decimals: u32) -> String {
    let decimals = decimals.min(18);
    let unit = 10u128.pow(18 - decimals);
    let rounded = (wei + unit / 2) / unit;
    let scale = 10u128.pow(decimals);
    let whole = rounded / scale;
    if decimals == 0 {
        return whole.to_string();
    }
    let frac = rounded % scale;
    format!("{}.{:0width$}", whole, frac, width = decimals as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_well_formed() {
        let addr = Address::new("0x4200000000000000000000000000000000000006");
        assert!(addr.is_well_formed());

        assert!(!Address::new("4200000000000000000000000000000000000006").is_well_formed());
        assert!(!Address::new("0x42").is_well_formed());
        assert!(!Address::new("0xzz00000000000000000000000000000000000006").is_well_formed());
    }

    #[test]
    fn test_tx_hash_well_formed() {
        let hash = TxHash::new(format!("0x{}", "ab".repeat(32)));
        assert!(hash.is_well_formed());
        assert!(!TxHash::new("0xabc").is_well_formed());
    }

    #[test]
    fn test_network_chain_ids() {
        assert_eq!(Network::Base.chain_id(), 8453);
        assert_eq!(Network::BaseSepolia.chain_id(), 84532);
        assert_eq!(Network::from_chain_id(8453), Some(Network::Base));
        assert_eq!(Network::from_chain_id(1), None);
    }

    #[test]
    fn test_format_eth() {
        assert_eq!(format_eth(2_500_000_000_000_000, 6), "0.002500");
        assert_eq!(format_eth(2_500_000_000_000, 6), "0.000003");
        assert_eq!(format_eth(2_500_000_000_000, 7), "0.0000025");
        assert_eq!(format_eth(1_000_000_000_000_000_000, 2), "1.00");
        assert_eq!(format_eth(1_000_000_000_000_000_000, 0), "1");
    }

    #[test]
    fn test_unsigned_tx_serializes_camel_case() {
        let tx = UnsignedTx {
            from: None,
            to: Address::new("0x0000000000000000000000000000000000000001"),
            value: "0x1".to_string(),
            data: "0x".to_string(),
            chain_id: "0x2105".to_string(),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["chainId"], "0x2105");
        assert!(json.get("from").is_none());
    }
}
