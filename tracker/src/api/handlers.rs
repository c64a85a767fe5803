use axum::{extract::State, Json};
use dai_tracker::{parse_bulk_input, WalletRecord};
use std::sync::Arc;

use super::types::{RpcSettings, StatusResponse, SummaryResponse, UploadRequest, UploadResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn health_handler() -> &'static str {
    "ok"
}

pub async fn list_wallets_handler(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<WalletRecord>> {
    Json(state.store.load().await)
}

pub async fn sync_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WalletRecord>>, ApiError> {
    let _guard = state.begin_sync();
    let wallets = state.store.load().await;
    let updated = state.orchestrator.sync_now(wallets).await?;
    Ok(Json(updated))
}

pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let entries = parse_bulk_input(&req.text);
    if entries.is_empty() {
        return Err(ApiError::InvalidInput(
            "no valid addresses found in upload".to_string(),
        ));
    }

    let _guard = state.begin_sync();
    let current = state.store.load().await;
    let wallets = state
        .orchestrator
        .register_addresses(current, &entries)
        .await?;

    Ok(Json(UploadResponse {
        registered: entries.len(),
        wallets,
    }))
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let wallets = state.store.load_cached();
    Json(StatusResponse {
        last_sync: state.store.last_sync().await,
        remote_enabled: state.store.remote_enabled(),
        rpc_endpoint: state.reader.endpoint(),
        syncing: state.is_syncing(),
        wallet_count: wallets.len(),
    })
}

pub async fn get_rpc_handler(State(state): State<Arc<AppState>>) -> Json<RpcSettings> {
    Json(RpcSettings {
        url: state.reader.endpoint(),
    })
}

pub async fn set_rpc_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RpcSettings>,
) -> Result<Json<RpcSettings>, ApiError> {
    let url = req.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ApiError::InvalidInput(format!(
            "RPC URL must start with http:// or https://, got '{}'",
            url
        )));
    }

    state.store.set_rpc_endpoint(url)?;
    state.reader.set_endpoint(url);

    Ok(Json(RpcSettings {
        url: url.to_string(),
    }))
}

pub async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let wallets = state.store.load_cached();
    Json(SummaryResponse {
        summary: state.summary.summarize(&wallets).await,
    })
}
