//! Purchase panel endpoints

use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use cat8004::{clamp_input, quick_select_units, step_units, PurchasePhase, PurchaseSession};
use minter_core::{AppConfig, SaleParams};

use crate::dto::{ApiError, PurchaseRequest, PurchaseStatusResponse, UnitsRequest};
use crate::purchase::{start_purchase, PurchaseStarted};
use crate::AppState;

/// Create purchase routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(purchase))
        .route("/status", get(get_status))
        .route("/units", post(set_units))
        .route("/dismiss", post(dismiss))
}

fn display_window(sale: &SaleParams) -> Duration {
    Duration::from_secs(sale.confirmed_display_secs)
}

/// Render the panel from a session snapshot
pub fn status_response(
    session: &PurchaseSession,
    config: &AppConfig,
    wallet_connected: bool,
) -> PurchaseStatusResponse {
    let sale = &config.sale.params;
    let block_reason = session.submit_block_reason(sale, wallet_connected);
    let explorer_tx_url = match &session.phase {
        PurchasePhase::Confirming { tx_hash, .. } | PurchasePhase::Confirmed { tx_hash, .. } => {
            Some(format!("{}/tx/{}", config.network.explorer_url(), tx_hash))
        }
        PurchasePhase::Failed {
            tx_hash: Some(tx_hash),
            ..
        } => Some(format!("{}/tx/{}", config.network.explorer_url(), tx_hash)),
        _ => None,
    };

    PurchaseStatusResponse {
        phase: session.phase.clone(),
        requested_units: session.requested_units,
        quote: session.quote(sale).into(),
        progress: session.progress.clone().into(),
        notice: session.notice.clone(),
        can_purchase: block_reason.is_none(),
        button_label: session.button_label(sale, wallet_connected),
        block_reason,
        explorer_tx_url,
    }
}

/// GET /purchase/status - Current phase, quote and button state
pub async fn get_status(State(state): State<AppState>) -> Json<PurchaseStatusResponse> {
    let config = state.config().await;
    let wallet_connected = state.wallet().await.is_some();

    let mut session = state.session().lock().await;
    session.tick(Instant::now(), display_window(&config.sale.params));
    Json(status_response(&session, &config, wallet_connected))
}

/// POST /purchase/units - Change the selected quantity
pub async fn set_units(
    State(state): State<AppState>,
    Json(request): Json<UnitsRequest>,
) -> Json<PurchaseStatusResponse> {
    let config = state.config().await;
    let sale = &config.sale.params;
    let wallet_connected = state.wallet().await.is_some();

    let mut session = state.session().lock().await;
    let units = if let Some(units) = request.units {
        units
    } else if let Some(input) = &request.input {
        clamp_input(sale, input) as i64
    } else if let Some(delta) = request.step {
        let available = session.progress.purchasable_units();
        step_units(sale, session.requested_units, delta, available) as i64
    } else if let Some(amount) = request.quick_select {
        quick_select_units(amount, session.progress.purchasable_units()) as i64
    } else {
        session.requested_units as i64
    };
    session.set_requested_units(sale, units);

    Json(status_response(&session, &config, wallet_connected))
}

/// POST /purchase - Start a purchase and return the wallet page to open
pub async fn purchase(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<PurchaseStarted>, (StatusCode, Json<ApiError>)> {
    let units = match request.units {
        Some(units) => units,
        None => state.session().lock().await.requested_units,
    };

    start_purchase(&state, units)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::debug!("Purchase refused: {}", e);
            e.to_response()
        })
}

/// POST /purchase/dismiss - Clear the last notice
pub async fn dismiss(State(state): State<AppState>) -> StatusCode {
    state.session().lock().await.clear_notice();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use axum::body::Body;
    use axum::http::Request;
    use minter_core::Address;
    use tower::ServiceExt;

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_defaults() {
        let Json(status) = get_status(State(AppState::new())).await;
        assert_eq!(status.phase, PurchasePhase::Idle);
        assert_eq!(status.requested_units, 100);
        assert_eq!(status.button_label, "Connect Wallet");
        assert!(!status.can_purchase);
        assert_eq!(status.quote.native_cost_display, "0.0002500");
    }

    #[tokio::test]
    async fn test_units_updates() {
        let state = AppState::new();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_json("/purchase/units", serde_json::json!({ "units": 0 })))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["requested_units"], 1);

        let response = app
            .clone()
            .oneshot(post_json("/purchase/units", serde_json::json!({ "step": 10 })))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["requested_units"], 11);

        let response = app
            .clone()
            .oneshot(post_json("/purchase/units", serde_json::json!({ "input": "2500.9" })))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["requested_units"], 2500);

        let response = app
            .oneshot(post_json("/purchase/units", serde_json::json!({ "quick_select": 5000 })))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["requested_units"], 5000);
        assert_eq!(json["quote"]["fiat_cost_display"], "$50.00");
        assert_eq!(json["phase"], "idle");
    }

    #[tokio::test]
    async fn test_units_saturate_and_step_stops_at_supply() {
        let state = AppState::new();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_json(
                "/purchase/units",
                serde_json::json!({ "units": 18446744073709551615u64 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["requested_units"], 5000);

        {
            let mut session = state.session().lock().await;
            session.progress = cat8004::SaleProgress {
                minted_units: 499_700.0,
                total_mintable: 500_000.0,
                available_units: 300.0,
                source: cat8004::ProgressSource::Chain,
            };
            session.requested_units = 295;
        }
        let response = app
            .oneshot(post_json("/purchase/units", serde_json::json!({ "step": 10 })))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["requested_units"], 300);
        assert_eq!(json["button_label"], "Connect Wallet");
    }

    #[tokio::test]
    async fn test_ready_label_with_wallet() {
        let state = AppState::new();
        state
            .set_wallet(Address::new("0x00000000000000000000000000000000000000aa"))
            .await
            .unwrap();
        let Json(status) = get_status(State(state)).await;
        assert!(status.can_purchase);
        assert_eq!(status.button_label, "Mint 100 Cat8004");
    }

    #[tokio::test]
    async fn test_purchase_without_wallet_is_unauthorized() {
        let mut config = AppConfig::default();
        config.rpc.url = "http://127.0.0.1:1".to_string();
        config.sale.contract_address =
            Some(Address::new("0x0000000000000000000000000000000000008004"));
        let app = create_router(AppState::with_config(config));

        let response = app
            .oneshot(post_json("/purchase", serde_json::json!({ "units": 100 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], "wallet_not_connected");
    }
}
