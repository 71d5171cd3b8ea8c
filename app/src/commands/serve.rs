use anyhow::Context;
use minter_api::{serve_until, AppState};
use tokio::sync::broadcast;

use crate::tx_watcher::spawn_watcher;

/// Run the API until Ctrl-C
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let (notifications, _) = broadcast::channel(64);
    let watcher = spawn_watcher(state.clone(), notifications);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested");
    };

    let result = serve_until(state, port, shutdown)
        .await
        .with_context(|| format!("API server on port {} failed", port));
    watcher.abort();
    result
}
