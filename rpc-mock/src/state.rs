/// In-memory chain answering balance reads

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use dai_tracker::multicall::{aggregate3Call, balanceOfCall, Result3};
use dai_tracker::{DAI_TOKEN_ADDRESS, MULTICALL3_ADDRESS};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};

use crate::types::RpcFault;

/// Polygon mainnet
pub const CHAIN_ID: u64 = 137;

pub struct MockChain {
    aggregator: Address,
    token: Address,
    block_number: AtomicU64,
    balances: RwLock<HashMap<Address, U256>>,
    reverting: RwLock<HashSet<Address>>,
    batches: Mutex<Vec<usize>>,
}

impl MockChain {
    pub fn new(block_number: u64) -> Self {
        Self {
            aggregator: MULTICALL3_ADDRESS,
            token: DAI_TOKEN_ADDRESS,
            block_number: AtomicU64::new(block_number),
            balances: RwLock::new(HashMap::new()),
            reverting: RwLock::new(HashSet::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn aggregator(&self) -> Address {
        self.aggregator
    }

    pub fn block_number(&self) -> u64 {
        self.block_number.load(Ordering::SeqCst)
    }

    pub fn set_block_number(&self, height: u64) {
        self.block_number.store(height, Ordering::SeqCst);
    }

    pub fn set_balance(&self, holder: Address, raw: U256) {
        self.balances
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(holder, raw);
    }

    /// Make `balanceOf(holder)` revert
    pub fn mark_failing(&self, holder: Address) {
        self.reverting
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(holder);
    }

    /// Sub-call counts of every aggregate3 answered so far
    pub fn batches(&self) -> Vec<usize> {
        self.batch_log().clone()
    }

    fn batch_log(&self) -> MutexGuard<'_, Vec<usize>> {
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer an `eth_call` with ABI-encoded return data
    pub fn call(&self, to: Address, data: &[u8]) -> Result<Bytes, RpcFault> {
        if to != self.aggregator {
            return Err(RpcFault::execution(format!("no contract at {}", to)));
        }

        let call = aggregate3Call::abi_decode(data)
            .map_err(|e| RpcFault::execution(format!("execution reverted: {}", e)))?;
        self.batch_log().push(call.calls.len());
        log::debug!("aggregate3 with {} sub-calls", call.calls.len());

        let results: Vec<Result3> = call
            .calls
            .iter()
            .map(|sub| match self.balance_of(sub.target, &sub.callData) {
                Some(value) => Result3 {
                    success: true,
                    returnData: Bytes::from(value.abi_encode()),
                },
                None => Result3 {
                    success: false,
                    returnData: Bytes::new(),
                },
            })
            .collect();

        Ok(Bytes::from((results,).abi_encode_params()))
    }

    /// `None` when the sub-call would revert
    fn balance_of(&self, target: Address, call_data: &[u8]) -> Option<U256> {
        if target != self.token {
            return None;
        }
        let holder = balanceOfCall::abi_decode(call_data).ok()?.account;
        let reverting = self
            .reverting
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if reverting.contains(&holder) {
            return None;
        }
        let balances = self
            .balances
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(balances.get(&holder).copied().unwrap_or_default())
    }
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new(0)
    }
}
