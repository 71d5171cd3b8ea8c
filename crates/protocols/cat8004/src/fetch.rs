//! Cat8004 State Fetching from RPC
//!
//! Reads sale and account counters from the contract via `eth_call`.

use evm_rpc_client::RpcClient;
use minter_core::{Address, ProtocolError, RpcError, TxError};

use crate::abi;
use crate::state::{count_to_u64, scaled_to_units, AccountSnapshot, SaleProgress};

/// Fetch current sale progress
pub async fn fetch_mint_progress(
    client: &RpcClient,
    contract: &Address,
) -> Result<SaleProgress, ProtocolError> {
    let data = client
        .call(contract, &abi::encode_get_mint_progress())
        .await
        .map_err(|e| map_rpc_error(e, "getMintProgress"))?;
    let raw = abi::decode_mint_progress(&data)?;
    Ok(SaleProgress::from_raw(&raw))
}

/// Fetch sale progress, masking read failures.
///
/// Falls back to `last_known` when present, otherwise to the configured defaults.
pub async fn fetch_progress_or_fallback(
    client: &RpcClient,
    contract: &Address,
    last_known: Option<&SaleProgress>,
    default_total_units: u64,
) -> SaleProgress {
    match fetch_mint_progress(client, contract).await {
        Ok(progress) => progress,
        Err(e) => {
            tracing::warn!("Mint progress read failed, using fallback: {}", e);
            fallback_progress(last_known, default_total_units)
        }
    }
}

/// Last-known counters if we have them, defaults otherwise
pub fn fallback_progress(
    last_known: Option<&SaleProgress>,
    default_total_units: u64,
) -> SaleProgress {
    match last_known {
        Some(progress) => progress.as_last_known(),
        None => SaleProgress::fallback(default_total_units),
    }
}

/// Token balance of `account` in whole units, plus the raw value
pub async fn fetch_balance(
    client: &RpcClient,
    contract: &Address,
    account: &Address,
) -> Result<(f64, String), ProtocolError> {
    let call = abi::encode_balance_of(account).map_err(map_tx_error)?;
    let data = client
        .call(contract, &call)
        .await
        .map_err(|e| map_rpc_error(e, "balanceOf"))?;
    let raw = abi::decode_balance_of(&data)?;
    Ok((scaled_to_units(raw), raw.to_string()))
}

pub async fn fetch_expected_nft_count(
    client: &RpcClient,
    contract: &Address,
    account: &Address,
) -> Result<u64, ProtocolError> {
    let call = abi::encode_expected_nft_count(account).map_err(map_tx_error)?;
    let data = client
        .call(contract, &call)
        .await
        .map_err(|e| map_rpc_error(e, "getExpectedNFTCount"))?;
    Ok(count_to_u64(abi::decode_expected_nft_count(&data)?))
}

pub async fn fetch_distribution_count(
    client: &RpcClient,
    contract: &Address,
) -> Result<u64, ProtocolError> {
    let data = client
        .call(contract, &abi::encode_distribution_count())
        .await
        .map_err(|e| map_rpc_error(e, "getDistributionCount"))?;
    Ok(count_to_u64(abi::decode_distribution_count(&data)?))
}

/// Balance and expected collectibles for one address
pub async fn fetch_account_snapshot(
    client: &RpcClient,
    contract: &Address,
    account: &Address,
) -> Result<AccountSnapshot, ProtocolError> {
    let (token_balance, token_balance_raw) = fetch_balance(client, contract, account).await?;
    let expected_nft_count = fetch_expected_nft_count(client, contract, account).await?;

    Ok(AccountSnapshot {
        address: account.clone(),
        token_balance,
        token_balance_raw,
        expected_nft_count,
    })
}

fn map_rpc_error(err: RpcError, function: &str) -> ProtocolError {
    ProtocolError::StateUnavailable {
        reason: format!("{} read failed: {}", function, err),
    }
}

fn map_tx_error(err: TxError) -> ProtocolError {
    match err {
        TxError::InvalidAddress { address } => ProtocolError::InvalidAddress { address },
        other => ProtocolError::ActionNotAllowed {
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ProgressSource;
    use minter_core::RpcConfig;

    fn offline_client() -> RpcClient {
        RpcClient::new_without_probe(
            RpcConfig {
                url: "http://127.0.0.1:1".to_string(),
            },
            8453,
        )
        .unwrap()
    }

    fn contract() -> Address {
        Address::new("0x0000000000000000000000000000000000008004")
    }

    #[test]
    fn test_fallback_prefers_last_known() {
        let last = SaleProgress {
            minted_units: 10.0,
            total_mintable: 100.0,
            available_units: 90.0,
            source: ProgressSource::Chain,
        };
        let progress = fallback_progress(Some(&last), 500_000);
        assert_eq!(progress.minted_units, 10.0);
        assert_eq!(progress.source, ProgressSource::LastKnown);

        let progress = fallback_progress(None, 500_000);
        assert_eq!(progress.total_mintable, 500_000.0);
        assert_eq!(progress.source, ProgressSource::Default);
    }

    #[tokio::test]
    async fn test_unreachable_rpc_falls_back() {
        let client = offline_client();
        let progress = fetch_progress_or_fallback(&client, &contract(), None, 500_000).await;
        assert_eq!(progress.source, ProgressSource::Default);
        assert_eq!(progress.available_units, 500_000.0);

        let err = fetch_distribution_count(&client, &contract()).await.unwrap_err();
        assert!(matches!(err, ProtocolError::StateUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_bad_account_address() {
        let err = fetch_balance(&offline_client(), &contract(), &Address::new("0xnope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress { .. }));
    }
}
