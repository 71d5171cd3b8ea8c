//! Read-only sale commands

use anyhow::{bail, Context};
use cat8004::{
    clamp_input, compute_quote, fetch_account_snapshot, fetch_progress_or_fallback,
    price_breakdown, ProgressSource, SaleContract,
};
use evm_rpc_client::capabilities::classify;
use evm_rpc_client::{probe_rpc, CapabilityTier, RpcClient};
use minter_core::{Address, AppConfig};

fn contract(config: &AppConfig) -> anyhow::Result<SaleContract> {
    SaleContract::for_network(config.network, &config.sale).with_context(|| {
        format!(
            "No sale contract configured for {} (use --contract or {})",
            config.network,
            crate::cli::ENV_CONTRACT
        )
    })
}

/// Price a quantity as typed
pub fn quote(config: &AppConfig, input: &str) -> anyhow::Result<()> {
    let sale = &config.sale.params;
    let units = clamp_input(sale, input);
    if input.trim() != units.to_string() {
        println!("Quantity adjusted to {} (bounds {}..={})", units, sale.min_units, sale.max_units);
    }

    let quote = compute_quote(sale, units as i64);
    println!("Units:        {}", quote.requested_units);
    println!("Cost:         {} ETH", quote.native_cost_display());
    println!("Reference:    {}", quote.fiat_cost_display());
    println!("Collectibles: {}", quote.derived_item_count);
    Ok(())
}

/// Print the reference price table
pub fn breakdown(config: &AppConfig) -> anyhow::Result<()> {
    println!("{:>8}  {:>12}  {:>10}", "Units", "ETH", "USD");
    for row in price_breakdown(&config.sale.params) {
        println!(
            "{:>8}  {:>12}  {:>10}",
            row.units, row.native_cost_display, row.fiat_cost_display
        );
    }
    Ok(())
}

/// Print sale progress (fallback counters when the read fails)
pub async fn progress(config: &AppConfig) -> anyhow::Result<()> {
    let contract = contract(config)?;
    let client = RpcClient::new_without_probe(config.rpc.clone(), config.network.chain_id())?;
    let progress = fetch_progress_or_fallback(
        &client,
        &contract.address,
        None,
        config.sale.params.default_total_units,
    )
    .await;

    if progress.source != ProgressSource::Chain {
        println!("Sale progress unavailable, showing defaults");
    }
    println!(
        "Minted:    {:.0} / {:.0} ({:.1}%)",
        progress.minted_units,
        progress.total_mintable,
        progress.progress_pct()
    );
    println!(
        "Available: {:.0} ({:.1}%)",
        progress.available_units,
        progress.remaining_pct()
    );
    if progress.is_sold_out() {
        println!("Sold out!");
    }
    Ok(())
}

/// Print endpoint reachability, chain and latency
pub async fn status(config: &AppConfig) -> anyhow::Result<()> {
    let expected = config.network.chain_id();
    println!("Endpoint: {}", config.rpc.url);
    println!("Network:  {} (chain {})", config.network, expected);

    match probe_rpc(&config.rpc.url).await {
        Some(probe) => {
            println!("Status:   {}", classify(probe.chain_id, expected).as_str());
            println!("Chain:    {}", probe.chain_id);
            println!("Block:    {}", probe.block_number);
            println!("Latency:  {} ms", probe.latency_ms);
        }
        None => println!("Status:   {}", CapabilityTier::Offline.as_str()),
    }
    Ok(())
}

/// Print an account's holdings
pub async fn account(config: &AppConfig, address: &str) -> anyhow::Result<()> {
    let account = Address::new(address);
    if !account.is_well_formed() {
        bail!("Invalid address: {}", address);
    }
    let contract = contract(config)?;
    let client = RpcClient::new(config.rpc.clone(), config.network.chain_id())
        .await
        .with_context(|| format!("RPC endpoint {} unreachable", config.rpc.url))?;

    let snapshot = fetch_account_snapshot(&client, &contract.address, &account).await?;
    println!("Account:      {}", snapshot.address);
    println!("Balance:      {} {}", snapshot.token_balance, cat8004::TOKEN_SYMBOL);
    println!("Collectibles: {}", snapshot.expected_nft_count);
    Ok(())
}
