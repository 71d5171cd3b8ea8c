//! Command-line arguments and configuration loading

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use minter_core::{Address, AppConfig, Network};

/// Environment variable overriding the RPC endpoint
pub const ENV_RPC_URL: &str = "MINTER_RPC_URL";
/// Environment variable overriding the sale contract address
pub const ENV_CONTRACT: &str = "MINTER_CONTRACT";

/// Cat8004 minter
#[derive(Debug, Parser)]
#[command(name = "minter")]
#[command(about = "Quote, track and mint the Cat8004 token sale")]
#[command(version)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Network to use
    #[arg(short, long, value_enum)]
    pub network: Option<NetworkArg>,

    /// JSON-RPC endpoint
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Sale contract address
    #[arg(long)]
    pub contract: Option<String>,

    /// Debug logging for the minter crates
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the local HTTP API
    Serve {
        /// API port (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Price a quantity
    Quote {
        /// Quantity as typed; clamped to the sale bounds
        units: String,
    },
    /// Show sale progress
    Progress,
    /// Show the reference price table
    Breakdown,
    /// Show RPC endpoint status
    Status,
    /// Show an account's balance and collectibles owed
    Account {
        address: String,
    },
    /// Connect a browser wallet and mint
    Mint {
        /// Quantity as typed; clamped to the sale bounds
        units: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NetworkArg {
    Base,
    BaseSepolia,
}

impl From<NetworkArg> for Network {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Base => Network::Base,
            NetworkArg::BaseSepolia => Network::BaseSepolia,
        }
    }
}

/// Overrides applied on top of the config file, lowest precedence first
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub network: Option<Network>,
    pub rpc_url: Option<String>,
    pub contract: Option<String>,
}

impl Overrides {
    /// Environment first, then flags
    pub fn from_env_and_cli(cli: &Cli) -> Self {
        Self {
            network: cli.network.map(Network::from),
            rpc_url: cli
                .rpc_url
                .clone()
                .or_else(|| std::env::var(ENV_RPC_URL).ok()),
            contract: cli
                .contract
                .clone()
                .or_else(|| std::env::var(ENV_CONTRACT).ok()),
        }
    }
}

/// Build the effective config: file (or defaults), then overrides.
pub fn load_config(path: Option<&PathBuf>, overrides: Overrides) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(network) = overrides.network {
        // Follow the network's public endpoint unless one was chosen explicitly
        if config.rpc.url == config.network.default_rpc_url() {
            config.rpc.url = network.default_rpc_url().to_string();
        }
        config.network = network;
    }
    if let Some(url) = overrides.rpc_url {
        config.rpc.url = url;
    }
    if let Some(contract) = overrides.contract {
        config.sale.contract_address = Some(Address::new(contract));
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_mint() {
        let cli = Cli::try_parse_from([
            "minter",
            "--network",
            "base-sepolia",
            "mint",
            "1000",
        ])
        .unwrap();
        assert_eq!(cli.network, Some(NetworkArg::BaseSepolia));
        assert!(matches!(cli.command, Commands::Mint { ref units } if units == "1000"));
    }

    #[test]
    fn test_network_override_follows_default_endpoint() {
        let config = load_config(
            None,
            Overrides {
                network: Some(Network::BaseSepolia),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.network, Network::BaseSepolia);
        assert_eq!(config.rpc.url, "https://sepolia.base.org");
    }

    #[test]
    fn test_explicit_rpc_wins() {
        let config = load_config(
            None,
            Overrides {
                network: Some(Network::BaseSepolia),
                rpc_url: Some("http://localhost:8545".to_string()),
                contract: Some("0x0000000000000000000000000000000000008004".to_string()),
            },
        )
        .unwrap();
        assert_eq!(config.rpc.url, "http://localhost:8545");
        assert!(config.sale.contract_address.is_some());
    }

    #[test]
    fn test_bad_contract_rejected() {
        let result = load_config(
            None,
            Overrides {
                contract: Some("0x1234".to_string()),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }
}
