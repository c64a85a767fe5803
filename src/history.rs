//! Daily balance history folding
//!
//! Keeps each wallet's series bounded: one entry per UTC calendar day,
//! at most `MAX_HISTORY_ENTRIES`, oldest evicted first.

use chrono::{DateTime, Utc};

use crate::model::{HistoryEntry, WalletRecord};

/// Number of daily entries retained per wallet
pub const MAX_HISTORY_ENTRIES: usize = 7;

/// Fold a new balance observation into a wallet's history
///
/// An observation on the same UTC day as the latest entry replaces that
/// entry; otherwise it is appended and the oldest entry is evicted once the
/// series exceeds `MAX_HISTORY_ENTRIES`. Returns a new record carrying the
/// observation as its current balance.
pub fn fold(record: &WalletRecord, balance: f64, observed_at: DateTime<Utc>) -> WalletRecord {
    WalletRecord {
        current_balance: balance,
        last_updated: Some(observed_at),
        history: fold_history(&record.history, balance, observed_at),
        ..record.clone()
    }
}

/// History-only variant of [`fold`]
pub fn fold_history(
    history: &[HistoryEntry],
    balance: f64,
    observed_at: DateTime<Utc>,
) -> Vec<HistoryEntry> {
    let mut updated = history.to_vec();
    let entry = HistoryEntry {
        date: observed_at,
        balance,
    };

    match updated.last_mut() {
        Some(last) if last.date.date_naive() == observed_at.date_naive() => *last = entry,
        _ => updated.push(entry),
    }

    if updated.len() > MAX_HISTORY_ENTRIES {
        let excess = updated.len() - MAX_HISTORY_ENTRIES;
        updated.drain(..excess);
    }

    updated
}
