//! Cat8004 contract ABI
//!
//! Call encoding and return decoding for the sale contract's public surface.

use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};
use minter_core::{Address, ProtocolError, TxError};

sol! {
    interface ICat8004 {
        function getMintProgress() external view returns (uint256 minted, uint256 total, uint256 available);
        function balanceOf(address account) external view returns (uint256);
        function getExpectedNFTCount(address account) external view returns (uint256);
        function getDistributionCount() external view returns (uint256);
        function mint(uint256 units) external payable;
    }
}

/// Raw 1e18-scaled counters returned by `getMintProgress`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMintProgress {
    pub minted: U256,
    pub total: U256,
    pub available: U256,
}

/// Parse a hex address into its ABI form
pub fn to_sol_address(address: &Address) -> Result<alloy_primitives::Address, TxError> {
    address
        .as_str()
        .parse::<alloy_primitives::Address>()
        .map_err(|_| TxError::InvalidAddress {
            address: address.to_string(),
        })
}

pub fn encode_get_mint_progress() -> Vec<u8> {
    ICat8004::getMintProgressCall {}.abi_encode()
}

pub fn encode_balance_of(account: &Address) -> Result<Vec<u8>, TxError> {
    Ok(ICat8004::balanceOfCall {
        account: to_sol_address(account)?,
    }
    .abi_encode())
}

pub fn encode_expected_nft_count(account: &Address) -> Result<Vec<u8>, TxError> {
    Ok(ICat8004::getExpectedNFTCountCall {
        account: to_sol_address(account)?,
    }
    .abi_encode())
}

pub fn encode_distribution_count() -> Vec<u8> {
    ICat8004::getDistributionCountCall {}.abi_encode()
}

/// Call data for `mint(units)`
pub fn encode_mint(units: u64) -> Vec<u8> {
    ICat8004::mintCall {
        units: U256::from(units),
    }
    .abi_encode()
}

pub fn decode_mint_progress(data: &[u8]) -> Result<RawMintProgress, ProtocolError> {
    let ret = ICat8004::getMintProgressCall::abi_decode_returns(data, true)
        .map_err(|e| decode_error("getMintProgress", e))?;
    Ok(RawMintProgress {
        minted: ret.minted,
        total: ret.total,
        available: ret.available,
    })
}

pub fn decode_balance_of(data: &[u8]) -> Result<U256, ProtocolError> {
    ICat8004::balanceOfCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(|e| decode_error("balanceOf", e))
}

pub fn decode_expected_nft_count(data: &[u8]) -> Result<U256, ProtocolError> {
    ICat8004::getExpectedNFTCountCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(|e| decode_error("getExpectedNFTCount", e))
}

pub fn decode_distribution_count(data: &[u8]) -> Result<U256, ProtocolError> {
    ICat8004::getDistributionCountCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(|e| decode_error("getDistributionCount", e))
}

fn decode_error(function: &str, err: alloy_sol_types::Error) -> ProtocolError {
    ProtocolError::DecodeError {
        message: format!("{} returned malformed data: {}", function, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u128) -> [u8; 32] {
        U256::from(value).to_be_bytes::<32>()
    }

    #[test]
    fn test_mint_call_layout() {
        let data = encode_mint(1000);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], ICat8004::mintCall::SELECTOR.as_slice());
        assert_eq!(&data[4..], &word(1000));
    }

    #[test]
    fn test_balance_of_encodes_address() {
        let account = Address::new("0x00000000000000000000000000000000000000aa");
        let data = encode_balance_of(&account).unwrap();
        assert_eq!(data.len(), 36);
        assert_eq!(data[35], 0xaa);
        assert!(data[4..35].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let err = encode_expected_nft_count(&Address::new("0x1234")).unwrap_err();
        assert!(matches!(err, TxError::InvalidAddress { .. }));
    }

    #[test]
    fn test_decode_mint_progress() {
        let scale = 1_000_000_000_000_000_000u128;
        let mut data = Vec::new();
        data.extend_from_slice(&word(1_500 * scale));
        data.extend_from_slice(&word(500_000 * scale));
        data.extend_from_slice(&word(498_500 * scale));

        let raw = decode_mint_progress(&data).unwrap();
        assert_eq!(raw.minted, U256::from(1_500 * scale));
        assert_eq!(raw.total, U256::from(500_000 * scale));
        assert_eq!(raw.available, U256::from(498_500 * scale));
    }

    #[test]
    fn test_decode_short_data_fails() {
        assert!(matches!(
            decode_mint_progress(&[0u8; 40]),
            Err(ProtocolError::DecodeError { .. })
        ));
        assert!(decode_distribution_count(&[]).is_err());
    }

    #[test]
    fn test_decode_single_word() {
        assert_eq!(decode_distribution_count(&word(7)).unwrap(), U256::from(7));
    }
}
