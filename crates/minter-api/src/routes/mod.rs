//! API route handlers

pub mod health;
pub mod purchase;
pub mod rpc;
pub mod sale;
pub mod wallet;

use axum::{routing::get, Router};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/rpc", rpc::router())
        .nest("/sale", sale::router())
        .nest("/wallet", wallet::router())
        .nest("/purchase", purchase::router())
        .with_state(state)
}
