//! Interactive mint through the browser wallet

use std::time::Duration;

use anyhow::bail;
use cat8004::clamp_input;
use minter_api::{start_purchase, AppState};
use minter_core::Address;
use tokio::sync::broadcast;
use wallet_bridge::RequestStatus;

use crate::tx_watcher::{spawn_watcher, wait_for_outcome, NotificationKind};

const WALLET_POLL_INTERVAL: Duration = Duration::from_millis(500);

async fn connect_wallet(state: &AppState) -> anyhow::Result<Address> {
    let bridge = state.bridge_server().await?;
    let chain_id = state.network().await.chain_id();
    let (request_id, url) = bridge.create_connect_request(chain_id).await;

    println!("Open this page to connect your wallet:\n  {}", url);
    match bridge.wait_for_completion(&request_id, WALLET_POLL_INTERVAL).await {
        RequestStatus::AddressReceived(address) => {
            let address = Address::new(address);
            state.set_wallet(address.clone()).await?;
            println!("Connected {}", address);
            Ok(address)
        }
        RequestStatus::Rejected => bail!("Connection rejected in wallet"),
        RequestStatus::Failed(error) => bail!("Wallet connection failed: {}", error),
        other => bail!("Wallet connection ended without an account: {:?}", other),
    }
}

/// Connect, submit and wait for the outcome
pub async fn mint(state: AppState, input: &str) -> anyhow::Result<()> {
    let units = clamp_input(&state.sale_params().await, input);

    let (notifications, mut receiver) = broadcast::channel(16);
    let watcher = spawn_watcher(state.clone(), notifications);

    connect_wallet(&state).await?;

    let started = start_purchase(&state, units).await?;
    println!(
        "{} for {} ETH ({})",
        started.summary.action,
        started.summary.native_cost_display,
        started.summary.fiat_cost_display
    );
    println!("Open this page to confirm in your wallet:\n  {}", started.sign_url);

    let outcome = wait_for_outcome(&mut receiver, |event| {
        if event.kind == NotificationKind::Broadcast {
            if let Some(url) = &event.explorer_url {
                println!("Transaction broadcast, waiting for confirmation:\n  {}", url);
            }
        }
    })
    .await;
    watcher.abort();

    match outcome {
        Some(event) if event.kind == NotificationKind::Confirmed => {
            println!("Success! {}", event.description);
            if let Some(url) = event.explorer_url {
                println!("  {}", url);
            }
            Ok(())
        }
        Some(event) if event.kind == NotificationKind::Cancelled => bail!("{}", event.description),
        Some(event) => bail!("Mint failed: {}", event.description),
        None => bail!("Gave up waiting for the transaction"),
    }
}
