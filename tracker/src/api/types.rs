use chrono::{DateTime, Utc};
use dai_tracker::WalletRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Distinct addresses recognised in the upload
    pub registered: usize,
    pub wallets: Vec<WalletRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub last_sync: Option<DateTime<Utc>>,
    pub remote_enabled: bool,
    pub rpc_endpoint: String,
    pub syncing: bool,
    pub wallet_count: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RpcSettings {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}
