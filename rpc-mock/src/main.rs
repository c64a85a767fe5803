/// EVM JSON-RPC Mock Server
///
/// Answers `eth_blockNumber`, `eth_chainId` and Multicall3 `balanceOf`
/// batches from an in-memory table. Designed for local development.

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use rpc_mock::handlers::parse_balances;
use rpc_mock::{run_server, BalancesRequest, MockChain};

#[derive(Debug)]
struct Config {
    server_host: String,
    server_port: u16,
    block_number: u64,
    balances_file: Option<String>,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8545".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        let block_number = env::var("MOCK_BLOCK_NUMBER")
            .unwrap_or_else(|_| "50000000".to_string())
            .parse()
            .context("Invalid MOCK_BLOCK_NUMBER")?;

        let balances_file = env::var("MOCK_BALANCES_FILE").ok();

        Ok(Self {
            server_host,
            server_port,
            block_number,
            balances_file,
        })
    }
}

fn load_balances(chain: &MockChain, path: &str) -> Result<()> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let table: BalancesRequest =
        serde_json::from_str(&contents).with_context(|| format!("Malformed balances in {}", path))?;
    let parsed = parse_balances(&table).map_err(anyhow::Error::msg)?;

    log::info!("Loaded {} balance(s) from {}", parsed.len(), path);
    for (holder, raw) in parsed {
        chain.set_balance(holder, raw);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting RPC Mock Server...");

    let config = Config::from_env().context("Failed to load configuration")?;

    let chain = Arc::new(MockChain::new(config.block_number));
    if let Some(path) = &config.balances_file {
        load_balances(&chain, path)?;
    }

    run_server(chain, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
