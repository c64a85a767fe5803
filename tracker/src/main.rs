use tracker::api::server;
use tracker::config::TrackerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger (set RUST_LOG=debug for verbose output, RUST_LOG=info for normal)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TrackerConfig::from_env();

    log::info!("Starting DAI balance tracker on {}", config.bind_address);
    server::start_server(config).await?;
    Ok(())
}
