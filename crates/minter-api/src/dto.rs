//! Data Transfer Objects for API requests and responses

use cat8004::{BlockReason, Notice, PurchasePhase, Quote, SaleProgress};
use serde::{Deserialize, Deserializer, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// RPC endpoint status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcStatusResponse {
    pub connected: bool,
    pub url: String,
    pub network: String,
    pub expected_chain_id: u64,
    pub chain_id: Option<u64>,
    pub block_number: u64,
    pub capability_tier: String,
}

/// RPC configuration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfigRequest {
    pub url: String,
}

/// Static sale information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleInfoResponse {
    pub token_name: String,
    pub token_symbol: String,
    pub network: String,
    pub chain_id: u64,
    pub contract_address: Option<String>,
    pub explorer_url: String,
    pub min_units: u64,
    pub max_units: u64,
    pub step_units: u64,
    pub items_per_bundle: u64,
    /// "0.0025000" ETH per 1000 units
    pub rate_per_thousand_display: String,
    pub fiat_per_thousand_display: String,
    pub quick_select_units: Vec<u64>,
}

/// Any JSON number as a quantity: fractions floor, out-of-range values saturate
fn saturating_units(number: &serde_json::Number) -> i64 {
    if let Some(units) = number.as_i64() {
        units
    } else if number.as_u64().is_some() {
        i64::MAX
    } else {
        number.as_f64().map_or(0, |units| units.floor() as i64)
    }
}

fn deserialize_units<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    serde_json::Number::deserialize(deserializer).map(|n| saturating_units(&n))
}

fn deserialize_optional_units<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<serde_json::Number>::deserialize(deserializer)
        .map(|n| n.as_ref().map(saturating_units))
}

/// Quote request. Out-of-range quantities are clamped, never rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    #[serde(deserialize_with = "deserialize_units")]
    pub units: i64,
}

/// Quote response
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: Quote,
    pub native_cost_display: String,
    pub fiat_cost_display: String,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            native_cost_display: quote.native_cost_display(),
            fiat_cost_display: quote.fiat_cost_display(),
            quote,
        }
    }
}

/// Sale progress with derived percentages
#[derive(Debug, Clone, Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub progress: SaleProgress,
    pub progress_pct: f64,
    pub remaining_pct: f64,
    pub purchasable_units: u64,
    pub sold_out: bool,
}

impl From<SaleProgress> for ProgressResponse {
    fn from(progress: SaleProgress) -> Self {
        Self {
            progress_pct: progress.progress_pct(),
            remaining_pct: progress.remaining_pct(),
            purchasable_units: progress.purchasable_units(),
            sold_out: progress.is_sold_out(),
            progress,
        }
    }
}

/// Distribution counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionsResponse {
    pub distribution_count: u64,
}

/// Wallet connect response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConnectResponse {
    pub request_id: String,
    pub connect_url: String,
}

/// Wallet status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletStatusResponse {
    pub connected: bool,
    pub address: Option<String>,
    /// "connected", "pending", "rejected", "expired", "failed" or "disconnected"
    pub status: String,
    pub error: Option<String>,
}

impl WalletStatusResponse {
    pub fn connected(address: impl Into<String>) -> Self {
        Self {
            connected: true,
            address: Some(address.into()),
            status: "connected".to_string(),
            error: None,
        }
    }

    pub fn not_connected(status: &str, error: Option<String>) -> Self {
        Self {
            connected: false,
            address: None,
            status: status.to_string(),
            error,
        }
    }
}

/// Connected account's holdings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: String,
    pub token_balance: f64,
    pub token_balance_raw: String,
    pub expected_nft_count: u64,
}

/// Quantity update for the purchase form.
///
/// Exactly one field is normally set. Precedence: `units`, `input`, `step`, `quick_select`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitsRequest {
    #[serde(default, deserialize_with = "deserialize_optional_units")]
    pub units: Option<i64>,
    /// Free-form entry as typed
    #[serde(default)]
    pub input: Option<String>,
    /// Stepper press, e.g. 10 or -10
    #[serde(default)]
    pub step: Option<i64>,
    #[serde(default)]
    pub quick_select: Option<u64>,
}

/// Purchase request. Defaults to the session's selected quantity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub units: Option<u64>,
}

/// Everything the purchase panel renders
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseStatusResponse {
    #[serde(flatten)]
    pub phase: PurchasePhase,
    pub requested_units: u64,
    pub quote: QuoteResponse,
    pub progress: ProgressResponse,
    pub notice: Option<Notice>,
    pub block_reason: Option<BlockReason>,
    pub button_label: String,
    pub can_purchase: bool,
    /// Explorer link for the transaction in the phase, if any
    pub explorer_tx_url: Option<String>,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}
