//! Storage and persistence layer
//!
//! - Local key/value cache (file system or memory)
//! - Optional shared remote document store
//! - Wallet collection persistence and reconciliation

mod cache;
mod remote;
mod wallet_store;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use remote::{RemoteStore, RestDocumentStore};
pub use wallet_store::{StoreBackend, WalletStore, LAST_SYNC_KEY, RPC_URL_KEY, WALLETS_KEY};
