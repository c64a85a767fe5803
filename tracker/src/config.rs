/// Tracker configuration from environment variables
///
/// Controls the default RPC endpoint, where the local cache lives, the
/// optional remote store and the optional summary model.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_RPC_URL: &str = "https://polygon-rpc.com";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_REMOTE_TABLE: &str = "kv_store";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Read endpoint used when no override is stored
    pub rpc_url: String,
    /// Directory of the local cache
    pub data_dir: PathBuf,
    pub remote_store_url: Option<String>,
    pub remote_store_key: Option<String>,
    pub remote_store_table: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub bind_address: String,
}

impl TrackerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `RPC_URL`: Polygon JSON-RPC endpoint (default `https://polygon-rpc.com`)
    /// - `DATA_DIR`: local cache directory (default `./data`)
    /// - `REMOTE_STORE_URL` / `REMOTE_STORE_KEY`: shared store; both required
    /// - `REMOTE_STORE_TABLE`: key/value table name (default `kv_store`)
    /// - `GEMINI_API_KEY` / `GEMINI_MODEL`: narrative summary (optional)
    /// - `BIND_ADDRESS`: listen address (default `0.0.0.0:3000`)
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Public endpoint, local cache only
    /// cargo run -p tracker
    ///
    /// # Against the local mock chain
    /// RPC_URL=http://localhost:8545 cargo run -p tracker
    /// ```
    pub fn from_env() -> Self {
        let rpc_url = non_empty_var("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        log::info!("📡 Default RPC URL: {}", rpc_url);

        let data_dir = PathBuf::from(
            non_empty_var("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );
        log::info!("📁 Local cache directory: {}", data_dir.display());

        let remote_store_url = non_empty_var("REMOTE_STORE_URL");
        let remote_store_key = non_empty_var("REMOTE_STORE_KEY");
        let remote_store_table =
            non_empty_var("REMOTE_STORE_TABLE").unwrap_or_else(|| DEFAULT_REMOTE_TABLE.to_string());
        match (&remote_store_url, &remote_store_key) {
            (Some(url), Some(_)) => log::info!("🔗 Remote store: {} (table {})", url, remote_store_table),
            (Some(_), None) | (None, Some(_)) => {
                log::warn!("⚠️  Remote store needs both REMOTE_STORE_URL and REMOTE_STORE_KEY, running local-only")
            }
            (None, None) => log::info!("💾 Remote store not configured, running local-only"),
        }

        let gemini_api_key = non_empty_var("GEMINI_API_KEY");
        let gemini_model =
            non_empty_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        if gemini_api_key.is_some() {
            log::info!("🤖 Narrative summaries via {}", gemini_model);
        }

        let bind_address =
            non_empty_var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        Self {
            rpc_url,
            data_dir,
            remote_store_url,
            remote_store_key,
            remote_store_table,
            gemini_api_key,
            gemini_model,
            bind_address,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            remote_store_url: None,
            remote_store_key: None,
            remote_store_table: DEFAULT_REMOTE_TABLE.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
