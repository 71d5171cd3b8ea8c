//! RPC capability detection
//!
//! Probes the endpoint for reachability, chain id and head block.

use serde::{Deserialize, Serialize};

use crate::RpcClient;

/// Capability tier based on what the endpoint reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CapabilityTier {
    /// Reachable and serving the expected chain
    Ready,
    /// Reachable but serving a different chain
    WrongChain,
    /// Not reachable
    Offline,
}

impl CapabilityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::WrongChain => "WrongChain",
            Self::Offline => "Offline",
        }
    }
}

/// Endpoint capabilities detected through probing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcCapabilities {
    /// Endpoint is reachable and responding
    pub is_online: bool,

    /// Chain id reported by `eth_chainId`
    pub chain_id: Option<u64>,

    /// Latest block number
    pub block_number: u64,

    pub capability_tier: CapabilityTier,
}

impl RpcCapabilities {
    pub fn offline() -> Self {
        Self {
            is_online: false,
            chain_id: None,
            block_number: 0,
            capability_tier: CapabilityTier::Offline,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.capability_tier == CapabilityTier::Ready
    }
}

/// Classify a probe result against the chain we expect to talk to
pub fn classify(chain_id: u64, expected_chain_id: u64) -> CapabilityTier {
    if chain_id == expected_chain_id {
        CapabilityTier::Ready
    } else {
        CapabilityTier::WrongChain
    }
}

/// Detect endpoint capabilities by probing `eth_chainId` and `eth_blockNumber`
pub async fn detect_capabilities(client: &RpcClient, expected_chain_id: u64) -> RpcCapabilities {
    let chain_id = match client.chain_id().await {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!("Capability probe failed: {}", e);
            return RpcCapabilities::offline();
        }
    };

    let block_number = client.block_number().await.unwrap_or(0);
    let tier = classify(chain_id, expected_chain_id);

    if tier == CapabilityTier::WrongChain {
        tracing::warn!(
            expected = expected_chain_id,
            actual = chain_id,
            "RPC endpoint serves an unexpected chain"
        );
    }

    RpcCapabilities {
        is_online: true,
        chain_id: Some(chain_id),
        block_number,
        capability_tier: tier,
    }
}
