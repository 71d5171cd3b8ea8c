//! Cat8004 minter application library

pub mod cli;
pub mod commands;
pub mod tx_watcher;

use cli::{Cli, Commands, Overrides};
use minter_api::AppState;

/// Install the tracing subscriber. `RUST_LOG` still applies on top.
pub fn init_tracing(verbose: bool) {
    let crate_level = if verbose { "debug" } else { "info" };
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in [
        format!("minter={}", crate_level),
        format!("minter_lib={}", crate_level),
        format!("minter_api={}", crate_level),
        format!("cat8004={}", crate_level),
        "warn".to_string(),
    ] {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive {}: {}", directive, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run one command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides::from_env_and_cli(&cli);
    let config = cli::load_config(cli.config.as_ref(), overrides)?;
    tracing::debug!(network = %config.network, rpc = %config.rpc.url, "Configuration loaded");

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.api_port);
            tracing::info!("Starting minter API for {}", config.network);
            commands::serve(AppState::with_config(config), port).await
        }
        Commands::Quote { units } => commands::quote(&config, &units),
        Commands::Progress => commands::progress(&config).await,
        Commands::Breakdown => commands::breakdown(&config),
        Commands::Status => commands::status(&config).await,
        Commands::Account { address } => commands::account(&config, &address).await,
        Commands::Mint { units } => commands::mint(AppState::with_config(config), &units).await,
    }
}
