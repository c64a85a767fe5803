//! Synchronization operations
//!
//! Load, fetch balances, fold into history, persist. A chain read failure
//! aborts before anything is written.

use alloy_primitives::Address;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::address::{normalize_address, parse_address};
use crate::chain::ChainBalanceReader;
use crate::error::TrackerError;
use crate::history;
use crate::model::{AddressEntry, WalletRecord};
use crate::store::WalletStore;

/// Age after which the startup check triggers a sync
pub const AUTO_SYNC_INTERVAL_HOURS: i64 = 24;

/// True when no sync was ever recorded or the last one is older than 24 hours
pub fn is_sync_due(last_sync: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_sync {
        None => true,
        Some(last) => now - last > Duration::hours(AUTO_SYNC_INTERVAL_HOURS),
    }
}

/// Ties the balance reader, history folding and wallet store together
pub struct SyncOrchestrator {
    reader: Arc<ChainBalanceReader>,
    store: Arc<WalletStore>,
}

impl SyncOrchestrator {
    pub fn new(reader: Arc<ChainBalanceReader>, store: Arc<WalletStore>) -> Self {
        Self { reader, store }
    }

    pub fn reader(&self) -> &Arc<ChainBalanceReader> {
        &self.reader
    }

    pub fn store(&self) -> &Arc<WalletStore> {
        &self.store
    }

    /// Refresh every wallet's balance as of now
    pub async fn sync_now(&self, wallets: Vec<WalletRecord>) -> Result<Vec<WalletRecord>, TrackerError> {
        self.sync_now_at(wallets, Utc::now()).await
    }

    /// Refresh every wallet's balance with one shared observation time
    pub async fn sync_now_at(
        &self,
        wallets: Vec<WalletRecord>,
        observed_at: DateTime<Utc>,
    ) -> Result<Vec<WalletRecord>, TrackerError> {
        if wallets.is_empty() {
            log::debug!("Nothing to sync");
            return Ok(wallets);
        }

        log::info!("Syncing {} wallet(s)", wallets.len());
        let addresses = wallet_addresses(&wallets);
        let balances = self.reader.fetch_balances(&addresses).await?;

        let updated: Vec<WalletRecord> = wallets
            .iter()
            .map(|wallet| {
                let balance = parse_address(&wallet.address)
                    .and_then(|address| balances.get(&address).copied())
                    .unwrap_or(0.0);
                history::fold(wallet, balance, observed_at)
            })
            .collect();

        self.store.save(&updated).await?;
        if let Err(e) = self.store.set_last_sync(observed_at).await {
            log::warn!("Balances saved but sync timestamp not recorded: {}", e);
        }

        log::info!("Sync complete at {}", observed_at.to_rfc3339());
        Ok(updated)
    }

    /// Register new addresses against the current collection as of now
    pub async fn register_addresses(
        &self,
        current: Vec<WalletRecord>,
        entries: &[AddressEntry],
    ) -> Result<Vec<WalletRecord>, TrackerError> {
        self.register_addresses_at(current, entries, Utc::now()).await
    }

    /// Register new addresses, seeding each with one observation
    ///
    /// Addresses are normalized first and unparseable entries dropped.
    /// Entries replace existing records with the same address, so a second
    /// upload of an address updates its label.
    pub async fn register_addresses_at(
        &self,
        current: Vec<WalletRecord>,
        entries: &[AddressEntry],
        observed_at: DateTime<Utc>,
    ) -> Result<Vec<WalletRecord>, TrackerError> {
        let normalized: Vec<AddressEntry> = entries
            .iter()
            .filter_map(|entry| match normalize_address(&entry.address) {
                Some(address) => Some(AddressEntry {
                    address,
                    label: entry.label.clone(),
                }),
                None => {
                    log::warn!("Ignoring invalid address {}", entry.address);
                    None
                }
            })
            .collect();
        let entries = dedup_entries(&normalized);
        if entries.is_empty() {
            return Ok(current);
        }

        let addresses: Vec<Address> = entries
            .iter()
            .filter_map(|entry| parse_address(&entry.address))
            .collect();

        let block = self.reader.fetch_block_height().await;
        let balances = self.reader.fetch_balances(&addresses).await?;

        let registered: Vec<WalletRecord> = entries
            .iter()
            .map(|entry| {
                let balance = parse_address(&entry.address)
                    .and_then(|address| balances.get(&address).copied())
                    .unwrap_or(0.0);
                WalletRecord::registered(
                    entry.address.clone(),
                    entry.label.clone(),
                    balance,
                    block,
                    observed_at,
                )
            })
            .collect();

        let replaced: HashSet<&str> = registered.iter().map(|w| w.address.as_str()).collect();
        let mut merged: Vec<WalletRecord> = current
            .into_iter()
            .filter(|wallet| {
                let key = normalize_address(&wallet.address).unwrap_or_else(|| wallet.address.clone());
                !replaced.contains(key.as_str())
            })
            .collect();
        merged.extend(registered.iter().cloned());

        log::info!(
            "Registered {} address(es) at block {}, collection now {}",
            registered.len(),
            block,
            merged.len()
        );

        self.store.save(&merged).await?;
        Ok(merged)
    }

    /// Startup check: load, and sync when the last sync is absent or stale
    ///
    /// A failed sync is logged and the loaded collection returned as is.
    pub async fn startup(&self) -> Vec<WalletRecord> {
        self.startup_at(Utc::now()).await
    }

    pub async fn startup_at(&self, now: DateTime<Utc>) -> Vec<WalletRecord> {
        let wallets = self.store.load().await;
        let last_sync = self.store.last_sync().await;

        if wallets.is_empty() || !is_sync_due(last_sync, now) {
            log::info!(
                "Loaded {} wallet(s), last sync {}",
                wallets.len(),
                last_sync
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string())
            );
            return wallets;
        }

        log::info!("Last sync is stale, refreshing balances");
        match self.sync_now_at(wallets.clone(), now).await {
            Ok(updated) => updated,
            Err(e) => {
                log::warn!("Startup sync failed, keeping stored balances: {}", e);
                wallets
            }
        }
    }
}

fn wallet_addresses(wallets: &[WalletRecord]) -> Vec<Address> {
    wallets
        .iter()
        .filter_map(|wallet| {
            let parsed = parse_address(&wallet.address);
            if parsed.is_none() {
                log::warn!("Skipping unparseable stored address {}", wallet.address);
            }
            parsed
        })
        .collect()
}

/// One entry per address in first-seen position, carrying the last label
fn dedup_entries(entries: &[AddressEntry]) -> Vec<AddressEntry> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<AddressEntry> = Vec::new();
    for entry in entries {
        match positions.get(entry.address.as_str()) {
            Some(&index) => unique[index].label = entry.label.clone(),
            None => {
                positions.insert(entry.address.as_str(), unique.len());
                unique.push(entry.clone());
            }
        }
    }
    unique
}
