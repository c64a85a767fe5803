//! DAI Tracker: balance sync pipeline for DAI wallets on Polygon
//!
//! Reads ERC-20 balances for a collection of addresses through the
//! Multicall3 aggregator, folds each observation into a bounded per-day
//! history, and persists the collection to a local cache mirrored to an
//! optional shared document store.
//!
//! # Architecture
//!
//! - **ChainBalanceReader**: Batched `balanceOf` reads, 100 addresses per call
//! - **History**: At most one entry per calendar day, last 7 days kept
//! - **WalletStore**: Local cache plus optional remote mirror, reconciled on load
//! - **SyncOrchestrator**: Sync, registration and the 24-hour startup check
//!
//! # Example
//!
//! ```ignore
//! use dai_tracker::{ChainBalanceReader, MemoryCache, StoreBackend, SyncOrchestrator, WalletStore};
//! use std::sync::Arc;
//!
//! let reader = Arc::new(ChainBalanceReader::new("https://polygon-rpc.com"));
//! let store = Arc::new(WalletStore::new(Arc::new(MemoryCache::new()), StoreBackend::LocalOnly));
//! let orchestrator = SyncOrchestrator::new(reader, store);
//!
//! let wallets = orchestrator.startup().await;
//! let wallets = orchestrator.sync_now(wallets).await?;
//! ```

// Public modules
pub mod address;
pub mod amount;
pub mod chain;
pub mod error;
pub mod history;
pub mod model;
pub mod multicall;
pub mod rpc;
pub mod store;
pub mod sync;

// Re-exports for convenience
pub use address::{format_address, normalize_address, parse_address, parse_bulk_input};
pub use amount::{from_wei, TOKEN_DECIMALS};
pub use chain::{BalanceRead, ChainBalanceReader};
pub use error::TrackerError;
pub use history::MAX_HISTORY_ENTRIES;
pub use model::{AddressEntry, HistoryEntry, WalletRecord};
pub use multicall::{CHUNK_SIZE, DAI_TOKEN_ADDRESS, MULTICALL3_ADDRESS};
pub use rpc::{HttpRpc, RpcTransport};
pub use store::{
    FileCache, LocalCache, MemoryCache, RemoteStore, RestDocumentStore, StoreBackend, WalletStore,
};
pub use sync::{is_sync_due, SyncOrchestrator, AUTO_SYNC_INTERVAL_HOURS};

// Re-export primitive types used across the public API
pub use alloy_primitives::{Address, Bytes, U256};

// Common result type
pub type Result<T> = std::result::Result<T, TrackerError>;
