//! Sale endpoints: info, quotes, progress and the price table

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use cat8004::{
    compute_quote, fetch_distribution_count, fetch_mint_progress, format_usd_cents, params,
    price_breakdown, PriceRow, SaleProgress, QUICK_SELECT_UNITS, TOKEN_NAME, TOKEN_SYMBOL,
};
use minter_core::{format_eth, ProtocolError};

use crate::dto::{
    ApiError, DistributionsResponse, ProgressResponse, QuoteRequest, QuoteResponse,
    SaleInfoResponse,
};
use crate::AppState;

/// Create sale routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/info", get(get_info))
        .route("/quote", post(quote))
        .route("/progress", get(get_progress))
        .route("/breakdown", get(get_breakdown))
        .route("/distributions", get(get_distributions))
}

fn error_response(e: ProtocolError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError::new(e.error_code(), e.to_string())),
    )
}

/// Re-read progress into the session, masking failures with the fallback
pub async fn refresh_progress(state: &AppState) -> SaleProgress {
    let default_total = state.sale_params().await.default_total_units;
    let read = match state.sale_contract().await {
        Ok(contract) => match state.rpc_client().await {
            Some(client) => fetch_mint_progress(&client, &contract.address).await,
            None => Err(ProtocolError::StateUnavailable {
                reason: "RPC endpoint unreachable".to_string(),
            }),
        },
        Err(e) => Err(e),
    };

    let mut session = state.session().lock().await;
    session.apply_progress(read, default_total).clone()
}

/// GET /sale/info - Token, contract and schedule
pub async fn get_info(State(state): State<AppState>) -> Json<SaleInfoResponse> {
    let config = state.config().await;
    let sale = &config.sale.params;

    Json(SaleInfoResponse {
        token_name: TOKEN_NAME.to_string(),
        token_symbol: TOKEN_SYMBOL.to_string(),
        network: config.network.as_str().to_string(),
        chain_id: config.network.chain_id(),
        contract_address: config.sale.contract_address.as_ref().map(|a| a.to_string()),
        explorer_url: config.network.explorer_url().to_string(),
        min_units: sale.min_units,
        max_units: sale.max_units,
        step_units: params::STEP_UNITS,
        items_per_bundle: sale.items_per_bundle,
        rate_per_thousand_display: format_eth(
            sale.rate_wei_per_thousand as u128,
            params::NATIVE_DISPLAY_DECIMALS,
        ),
        fiat_per_thousand_display: format_usd_cents(sale.fiat_cents_per_thousand),
        quick_select_units: QUICK_SELECT_UNITS.to_vec(),
    })
}

/// POST /sale/quote - Price a quantity (clamped to the sale bounds)
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Json<QuoteResponse> {
    let sale = state.sale_params().await;
    Json(compute_quote(&sale, request.units).into())
}

/// GET /sale/progress - Minted, total and available units
pub async fn get_progress(State(state): State<AppState>) -> Json<ProgressResponse> {
    Json(refresh_progress(&state).await.into())
}

/// GET /sale/breakdown - Reference price table
pub async fn get_breakdown(State(state): State<AppState>) -> Json<Vec<PriceRow>> {
    let sale = state.sale_params().await;
    Json(price_breakdown(&sale))
}

/// GET /sale/distributions - Collectibles distributed so far
pub async fn get_distributions(
    State(state): State<AppState>,
) -> Result<Json<DistributionsResponse>, (StatusCode, Json<ApiError>)> {
    let contract = state.sale_contract().await.map_err(error_response)?;
    let client = state.rpc_client().await.ok_or_else(|| {
        error_response(ProtocolError::StateUnavailable {
            reason: "RPC endpoint unreachable".to_string(),
        })
    })?;

    let distribution_count = fetch_distribution_count(&client, &contract.address)
        .await
        .map_err(error_response)?;
    Ok(Json(DistributionsResponse { distribution_count }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use axum::body::Body;
    use axum::http::Request;
    use cat8004::ProgressSource;
    use minter_core::{Address, AppConfig};
    use tower::ServiceExt;

    fn offline_state() -> AppState {
        let mut config = AppConfig::default();
        config.rpc.url = "http://127.0.0.1:1".to_string();
        config.sale.contract_address =
            Some(Address::new("0x0000000000000000000000000000000000008004"));
        AppState::with_config(config)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_quote_clamps_and_formats() {
        let app = create_router(offline_state());
        let request = Request::builder()
            .method("POST")
            .uri("/sale/quote")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"units": 9999}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["requested_units"], 5000);
        assert_eq!(json["native_cost_display"], "0.0125000");
        assert_eq!(json["fiat_cost_display"], "$50.00");
        assert_eq!(json["derived_item_count"], 5);
    }

    #[tokio::test]
    async fn test_quote_clamps_any_number() {
        let app = create_router(offline_state());
        let cases = [
            (r#"{"units": 18446744073709551615}"#, 5000),
            (r#"{"units": 1e30}"#, 5000),
            (r#"{"units": 2500.5}"#, 2500),
            (r#"{"units": -1e30}"#, 1),
            (r#"{"units": 0.4}"#, 1),
        ];

        for (body, expected) in cases {
            let request = Request::builder()
                .method("POST")
                .uri("/sale/quote")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", body);
            assert_eq!(body_json(response).await["requested_units"], expected, "{}", body);
        }
    }

    #[tokio::test]
    async fn test_progress_falls_back_offline() {
        let state = offline_state();
        let progress = refresh_progress(&state).await;
        assert_eq!(progress.source, ProgressSource::Default);
        assert_eq!(progress.total_mintable, 500_000.0);

        let app = create_router(state);
        let request = Request::builder()
            .uri("/sale/progress")
            .body(Body::empty())
            .unwrap();
        let json = body_json(app.oneshot(request).await.unwrap()).await;
        assert_eq!(json["source"], "default");
        assert_eq!(json["progress_pct"], 0.0);
        assert_eq!(json["sold_out"], false);
    }

    #[tokio::test]
    async fn test_breakdown_and_info() {
        let state = offline_state();
        let Json(rows) = get_breakdown(State(state.clone())).await;
        let thousand = rows.iter().find(|r| r.units == 1000).unwrap();
        assert_eq!(thousand.native_cost_display, "0.0025000");
        assert_eq!(thousand.fiat_cost_display, "$10.00");

        let Json(info) = get_info(State(state)).await;
        assert_eq!(info.chain_id, 8453);
        assert_eq!(info.rate_per_thousand_display, "0.0025000");
        assert_eq!(info.quick_select_units, vec![1, 10, 100, 1000, 5000]);
    }

    #[tokio::test]
    async fn test_distributions_unavailable_offline() {
        let result = get_distributions(State(offline_state())).await;
        let (status, Json(body)) = result.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "state_unavailable");
    }
}
