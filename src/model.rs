//! Data models for tracked wallets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point of a wallet's daily balance series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub balance: f64,
}

/// A tracked address and its balance history
///
/// Field names serialize in camelCase; the same JSON document is shared
/// between the local cache, the remote store and the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    /// Lowercase `0x`-prefixed hex address, unique across the collection
    pub address: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub initial_balance: f64,
    /// Chain height at registration, 0 when it could not be read
    #[serde(default)]
    pub initial_block: u64,
    #[serde(default)]
    pub current_balance: f64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Oldest first, at most one entry per UTC day
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl WalletRecord {
    /// Build a freshly registered record seeded with one observation
    pub fn registered(
        address: String,
        owner: String,
        balance: f64,
        block: u64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            address,
            owner,
            initial_balance: balance,
            initial_block: block,
            current_balance: balance,
            last_updated: Some(observed_at),
            history: vec![HistoryEntry {
                date: observed_at,
                balance,
            }],
        }
    }

    /// Balance change across the retained history window
    pub fn history_change(&self) -> f64 {
        match (self.history.first(), self.history.last()) {
            (Some(first), Some(last)) => last.balance - first.balance,
            _ => 0.0,
        }
    }
}

/// One parsed line of bulk address input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressEntry {
    pub address: String,
    pub label: String,
}
