use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use crate::config::TrackerConfig;
use crate::state::AppState;

/// Build the router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/wallets", get(handlers::list_wallets_handler))
        .route("/api/wallets/upload", post(handlers::upload_handler))
        .route("/api/sync", post(handlers::sync_handler))
        .route("/api/status", get(handlers::status_handler))
        .route(
            "/api/settings/rpc",
            get(handlers::get_rpc_handler).put(handlers::set_rpc_handler),
        )
        .route("/api/summary", get(handlers::summary_handler))
        .layer(cors_layer())
        .with_state(state)
}

/// Set ALLOWED_ORIGINS="https://dashboard.example,https://preview.example" for production.
/// If not set, allows any origin (development mode).
fn cors_layer() -> CorsLayer {
    match std::env::var("ALLOWED_ORIGINS") {
        Ok(origins) if !origins.trim().is_empty() => {
            log::info!("CORS configured for origins: {}", origins);
            let origin_list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| match s.trim().parse() {
                    Ok(origin) => Some(origin),
                    Err(_) => {
                        log::warn!("Ignoring invalid CORS origin '{}'", s.trim());
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origin_list)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        _ => {
            log::warn!("CORS: Allowing all origins (development mode). Set ALLOWED_ORIGINS env var for production.");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

pub async fn start_server(config: TrackerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&config));

    // Startup check runs to completion before requests are accepted
    let wallets = state.orchestrator.startup().await;
    log::info!("Tracking {} wallet(s)", wallets.len());

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    log::info!("Server listening on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            log::info!("Received SIGTERM signal");
        },
    }

    log::info!("Shutdown signal received, exiting gracefully...");
}
