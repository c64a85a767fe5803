/// Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::state::MockChain;

pub fn create_router(chain: Arc<MockChain>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // JSON-RPC
        .route("/", post(json_rpc))
        // Health check
        .route("/health", get(health_check))
        // Mock controls
        .route("/mock/balances", post(set_balances))
        .route("/mock/failing", post(set_failing))
        .route("/mock/batches", get(get_batches))
        // Shared state
        .with_state(chain)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve on an already-bound listener
pub async fn serve(chain: Arc<MockChain>, listener: TcpListener) -> anyhow::Result<()> {
    axum::serve(listener, create_router(chain)).await?;
    Ok(())
}

pub async fn run_server(chain: Arc<MockChain>, host: String, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;
    let local: SocketAddr = listener.local_addr()?;

    log::info!("🚀 RPC mock server listening on http://{}", local);
    log::info!("⛓️  Chain id {} at block {}", crate::state::CHAIN_ID, chain.block_number());
    log::info!("🔧 Control endpoints: POST /mock/balances, POST /mock/failing, GET /mock/batches");

    serve(chain, listener).await
}
