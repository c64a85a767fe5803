//! Shared state behind the HTTP handlers

use dai_tracker::{
    ChainBalanceReader, FileCache, StoreBackend, SyncOrchestrator, WalletStore,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::TrackerConfig;
use crate::summary::SummaryClient;

pub struct AppState {
    pub reader: Arc<ChainBalanceReader>,
    pub store: Arc<WalletStore>,
    pub orchestrator: SyncOrchestrator,
    pub summary: SummaryClient,
    syncing: AtomicBool,
}

impl AppState {
    pub fn new(
        reader: Arc<ChainBalanceReader>,
        store: Arc<WalletStore>,
        summary: SummaryClient,
    ) -> Self {
        let orchestrator = SyncOrchestrator::new(reader.clone(), store.clone());
        Self {
            reader,
            store,
            orchestrator,
            summary,
            syncing: AtomicBool::new(false),
        }
    }

    /// Wire the pipeline from configuration
    ///
    /// A stored RPC override takes precedence over `RPC_URL`.
    pub fn from_config(config: &TrackerConfig) -> Self {
        let cache = Arc::new(FileCache::new_with_base_dir(config.data_dir.clone()));
        let backend = StoreBackend::from_credentials(
            config.remote_store_url.as_deref(),
            config.remote_store_key.as_deref(),
            &config.remote_store_table,
        );
        let store = Arc::new(WalletStore::new(cache, backend));

        let rpc_url = match store.rpc_endpoint() {
            Some(url) => {
                log::info!("Using stored RPC override {}", url);
                url
            }
            None => config.rpc_url.clone(),
        };
        let reader = Arc::new(ChainBalanceReader::new(&rpc_url));
        let summary = SummaryClient::new(config.gemini_api_key.clone(), &config.gemini_model);

        Self::new(reader, store, summary)
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// Raise the syncing flag until the guard drops
    ///
    /// Informational only; concurrent syncs are not rejected.
    pub fn begin_sync(&self) -> SyncingGuard<'_> {
        self.syncing.store(true, Ordering::SeqCst);
        SyncingGuard { flag: &self.syncing }
    }
}

pub struct SyncingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
