use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use super::cache::LocalCache;
use super::remote::{RemoteStore, RestDocumentStore};
use crate::address::normalize_address;
use crate::error::TrackerError;
use crate::model::WalletRecord;

/// Key of the wallet collection, locally and remotely
pub const WALLETS_KEY: &str = "dai_wallets";
/// Key of the last successful sync timestamp
pub const LAST_SYNC_KEY: &str = "dai_last_sync";
/// Local-only key of the user's RPC endpoint override
pub const RPC_URL_KEY: &str = "dai_rpc_url";

/// Where the wallet collection lives, fixed at construction
#[derive(Clone)]
pub enum StoreBackend {
    LocalOnly,
    Mirrored(Arc<dyn RemoteStore>),
}

impl StoreBackend {
    /// Remote store when both URL and key are present, local-only otherwise
    pub fn from_credentials(url: Option<&str>, key: Option<&str>, table: &str) -> Self {
        match (url, key) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                log::info!("Remote store enabled at {}", url);
                Self::Mirrored(Arc::new(RestDocumentStore::new(url, key, table)))
            }
            _ => {
                log::info!("Remote store credentials absent, running local-only");
                Self::LocalOnly
            }
        }
    }
}

/// Persists the wallet collection to the local cache and, when configured,
/// mirrors it to the shared remote store
pub struct WalletStore {
    cache: Arc<dyn LocalCache>,
    backend: StoreBackend,
}

impl WalletStore {
    pub fn new(cache: Arc<dyn LocalCache>, backend: StoreBackend) -> Self {
        Self { cache, backend }
    }

    pub fn remote_enabled(&self) -> bool {
        matches!(self.backend, StoreBackend::Mirrored(_))
    }

    /// Load the wallet collection
    ///
    /// With a remote store, local-only records are merged into the remote
    /// collection (remote wins on address conflicts), the merge is written
    /// back when it added anything, and the local cache is overwritten with
    /// the result. Any remote failure falls back to the local cache.
    pub async fn load(&self) -> Vec<WalletRecord> {
        let local = self.load_local();

        let remote = match &self.backend {
            StoreBackend::LocalOnly => return local,
            StoreBackend::Mirrored(remote) => remote,
        };

        match self.reconcile(remote.as_ref(), local.clone()).await {
            Ok(merged) => merged,
            Err(e) => {
                log::warn!("Remote load failed, using local cache: {}", e);
                local
            }
        }
    }

    async fn reconcile(
        &self,
        remote: &dyn RemoteStore,
        local: Vec<WalletRecord>,
    ) -> Result<Vec<WalletRecord>, TrackerError> {
        let mut merged: Vec<WalletRecord> = match remote.fetch(WALLETS_KEY).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| TrackerError::remote(format!("malformed wallet collection: {}", e)))?,
            None => Vec::new(),
        };

        let mut renamed = 0;
        for wallet in merged.iter_mut() {
            if let Some(address) = normalize_address(&wallet.address) {
                if address != wallet.address {
                    wallet.address = address;
                    renamed += 1;
                }
            }
        }

        let known: HashSet<String> = merged.iter().map(|w| address_key(&w.address)).collect();
        let missing: Vec<WalletRecord> = local
            .into_iter()
            .filter(|w| !known.contains(&address_key(&w.address)))
            .collect();

        if !missing.is_empty() || renamed > 0 {
            log::info!(
                "Pushing {} local-only wallet(s) and {} normalized address(es) to remote store",
                missing.len(),
                renamed
            );
            merged.extend(missing);
            remote
                .upsert(WALLETS_KEY, serde_json::to_value(&merged)?)
                .await?;
        }

        if let Err(e) = self.write_local(&merged) {
            log::warn!("Failed to refresh local cache after reconcile: {}", e);
        }

        Ok(merged)
    }

    /// Save the wallet collection
    ///
    /// The local write is authoritative and its failure is returned. A remote
    /// mirror failure is logged only.
    pub async fn save(&self, wallets: &[WalletRecord]) -> Result<(), TrackerError> {
        self.write_local(wallets)?;

        if let StoreBackend::Mirrored(remote) = &self.backend {
            let value = serde_json::to_value(wallets)?;
            if let Err(e) = remote.upsert(WALLETS_KEY, value).await {
                log::warn!("Remote save failed, local copy kept: {}", e);
            }
        }

        log::debug!("Saved {} wallet(s)", wallets.len());
        Ok(())
    }

    /// Timestamp of the last successful sync, remote value preferred
    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        if let StoreBackend::Mirrored(remote) = &self.backend {
            match remote.fetch(LAST_SYNC_KEY).await {
                Ok(Some(value)) => match serde_json::from_value(value) {
                    Ok(timestamp) => return Some(timestamp),
                    Err(e) => log::warn!("Malformed remote sync timestamp: {}", e),
                },
                Ok(None) => {}
                Err(e) => log::warn!("Remote sync timestamp unavailable: {}", e),
            }
        }
        self.read_local_json(LAST_SYNC_KEY)
    }

    /// Record a successful sync, locally then remotely
    pub async fn set_last_sync(&self, timestamp: DateTime<Utc>) -> Result<(), TrackerError> {
        let value = serde_json::to_value(timestamp)?;
        self.cache.set(LAST_SYNC_KEY, &value.to_string())?;

        if let StoreBackend::Mirrored(remote) = &self.backend {
            if let Err(e) = remote.upsert(LAST_SYNC_KEY, value).await {
                log::warn!("Remote sync timestamp write failed: {}", e);
            }
        }
        Ok(())
    }

    /// User's RPC endpoint override; never mirrored
    pub fn rpc_endpoint(&self) -> Option<String> {
        self.read_local_json::<String>(RPC_URL_KEY)
            .filter(|url| !url.trim().is_empty())
    }

    pub fn set_rpc_endpoint(&self, url: &str) -> Result<(), TrackerError> {
        let value = serde_json::to_string(url)?;
        self.cache.set(RPC_URL_KEY, &value)
    }

    /// Collection as last written to the local cache, without contacting the remote store
    pub fn load_cached(&self) -> Vec<WalletRecord> {
        self.load_local()
    }

    fn load_local(&self) -> Vec<WalletRecord> {
        self.read_local_json(WALLETS_KEY).unwrap_or_default()
    }

    fn write_local(&self, wallets: &[WalletRecord]) -> Result<(), TrackerError> {
        let json = serde_json::to_string(wallets)?;
        self.cache.set(WALLETS_KEY, &json)
    }

    /// Read a cached JSON blob, treating unreadable or malformed data as absent
    fn read_local_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Local cache read failed for {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring malformed cached {}: {}", key, e);
                None
            }
        }
    }
}

/// Comparison key for an address, lowercase when it parses
fn address_key(address: &str) -> String {
    normalize_address(address).unwrap_or_else(|| address.to_string())
}
