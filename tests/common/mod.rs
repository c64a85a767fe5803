//! Shared fakes for pipeline integration tests
//!
//! - `FakeChain`: answers aggregate3 from a balance table, records batch sizes
//! - `FakeRemote`: in-memory document store that can be switched offline
//! - `StampRejectingCache`: memory cache whose last-sync writes fail

#![allow(dead_code)]

use async_trait::async_trait;
use dai_tracker::multicall::{aggregate3Call, balanceOfCall, Result3};
use dai_tracker::store::LAST_SYNC_KEY;
use dai_tracker::{
    Address, Bytes, ChainBalanceReader, LocalCache, MemoryCache, RemoteStore, RpcTransport, StoreBackend,
    SyncOrchestrator, TrackerError, WalletStore, U256,
};
use alloy_sol_types::{SolCall, SolValue};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

pub fn one_token() -> U256 {
    U256::from(10u64).pow(U256::from(18u64))
}

/// Address made of one repeated hex digit, e.g. `0xaaaa...`
pub fn repeated(digit: char) -> String {
    format!("0x{}", digit.to_string().repeat(40))
}

#[derive(Default)]
pub struct FakeChain {
    pub balances: Mutex<HashMap<Address, U256>>,
    pub reverting: Mutex<HashSet<Address>>,
    pub batches: Mutex<Vec<usize>>,
    pub offline: AtomicBool,
    pub height_unavailable: AtomicBool,
    pub height: u64,
}

impl FakeChain {
    pub fn with_height(height: u64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    pub fn set_balance(&self, address: &str, raw: U256) {
        let address: Address = address.parse().unwrap();
        self.balances.lock().unwrap().insert(address, raw);
    }

    pub fn revert_for(&self, address: &str) {
        let address: Address = address.parse().unwrap();
        self.reverting.lock().unwrap().insert(address);
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn lose_block_height(&self) {
        self.height_unavailable.store(true, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl RpcTransport for FakeChain {
    async fn eth_call(&self, _to: Address, data: Bytes) -> Result<Bytes, TrackerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TrackerError::connection_failed("connection refused"));
        }
        let call = aggregate3Call::abi_decode(&data)
            .map_err(|e| TrackerError::DecodeFailed(e.to_string()))?;
        self.batches.lock().unwrap().push(call.calls.len());

        let balances = self.balances.lock().unwrap();
        let reverting = self.reverting.lock().unwrap();
        let results: Vec<Result3> = call
            .calls
            .iter()
            .map(|sub| {
                let holder = balanceOfCall::abi_decode(&sub.callData)
                    .map(|c| c.account)
                    .unwrap_or_default();
                if reverting.contains(&holder) {
                    Result3 {
                        success: false,
                        returnData: Bytes::new(),
                    }
                } else {
                    let value = balances.get(&holder).copied().unwrap_or_default();
                    Result3 {
                        success: true,
                        returnData: Bytes::from(value.abi_encode()),
                    }
                }
            })
            .collect();
        Ok(Bytes::from((results,).abi_encode_params()))
    }

    async fn block_number(&self) -> Result<u64, TrackerError> {
        if self.offline.load(Ordering::SeqCst) || self.height_unavailable.load(Ordering::SeqCst) {
            return Err(TrackerError::connection_failed("connection refused"));
        }
        Ok(self.height)
    }

    fn endpoint(&self) -> String {
        "fake://chain".to_string()
    }
}

#[derive(Default)]
pub struct FakeRemote {
    pub docs: Mutex<HashMap<String, Value>>,
    pub upserts: Mutex<Vec<String>>,
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn fetch(&self, key: &str) -> Result<Option<Value>, TrackerError> {
        Ok(self.docs.lock().unwrap().get(key).cloned())
    }

    async fn upsert(&self, key: &str, value: Value) -> Result<(), TrackerError> {
        self.upserts.lock().unwrap().push(key.to_string());
        self.docs.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

/// Delegates to a memory cache but refuses to record the last sync time
pub struct StampRejectingCache {
    pub inner: Arc<MemoryCache>,
}

impl LocalCache for StampRejectingCache {
    fn get(&self, key: &str) -> Result<Option<String>, TrackerError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TrackerError> {
        if key == LAST_SYNC_KEY {
            return Err(TrackerError::storage("quota exceeded"));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), TrackerError> {
        self.inner.remove(key)
    }
}

/// Orchestrator wired to fakes, with handles kept for assertions
pub struct Pipeline {
    pub chain: Arc<FakeChain>,
    pub cache: Arc<MemoryCache>,
    pub store: Arc<WalletStore>,
    pub orchestrator: SyncOrchestrator,
}

impl Pipeline {
    pub fn local_only(chain: FakeChain) -> Self {
        Self::build(chain, StoreBackend::LocalOnly)
    }

    pub fn mirrored(chain: FakeChain, remote: Arc<FakeRemote>) -> Self {
        Self::build(chain, StoreBackend::Mirrored(remote))
    }

    /// Local-only pipeline whose last-sync writes fail
    pub fn rejecting_sync_stamp(chain: FakeChain) -> Self {
        let cache = Arc::new(MemoryCache::new());
        let local = Arc::new(StampRejectingCache {
            inner: cache.clone(),
        });
        Self::assemble(chain, cache, local, StoreBackend::LocalOnly)
    }

    fn build(chain: FakeChain, backend: StoreBackend) -> Self {
        let cache = Arc::new(MemoryCache::new());
        Self::assemble(chain, cache.clone(), cache, backend)
    }

    fn assemble(
        chain: FakeChain,
        cache: Arc<MemoryCache>,
        local: Arc<dyn LocalCache>,
        backend: StoreBackend,
    ) -> Self {
        let chain = Arc::new(chain);
        let store = Arc::new(WalletStore::new(local, backend));
        let reader = Arc::new(ChainBalanceReader::with_transport(chain.clone()));
        let orchestrator = SyncOrchestrator::new(reader, store.clone());
        Self {
            chain,
            cache,
            store,
            orchestrator,
        }
    }
}
