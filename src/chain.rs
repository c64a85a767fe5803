//! Batched token balance reads
//!
//! Holds the current RPC handle and splits address lists into
//! aggregator-sized chunks. One chunk failing aborts the whole fetch;
//! one address failing inside a chunk does not.

use alloy_primitives::{Address, U256};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::amount::from_wei;
use crate::error::TrackerError;
use crate::multicall::{
    decode_balance, decode_batch_results, encode_balance_batch, CHUNK_SIZE, DAI_TOKEN_ADDRESS,
    MULTICALL3_ADDRESS,
};
use crate::rpc::{HttpRpc, RpcTransport};

/// Outcome of one address's balance read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceRead {
    /// The token contract answered; may be zero
    Confirmed(U256),
    /// The sub-call reverted or returned undecodable data
    Failed,
}

impl BalanceRead {
    /// Raw amount, with failed reads counted as zero
    pub fn raw_or_zero(&self) -> U256 {
        match self {
            Self::Confirmed(value) => *value,
            Self::Failed => U256::ZERO,
        }
    }
}

/// Reads token balances through the aggregator contract
pub struct ChainBalanceReader {
    transport: RwLock<Arc<dyn RpcTransport>>,
    aggregator: Address,
    token: Address,
    chunk_size: usize,
}

impl ChainBalanceReader {
    /// Reader for DAI on Polygon via Multicall3 at the given endpoint
    pub fn new(rpc_url: &str) -> Self {
        Self::with_transport(Arc::new(HttpRpc::new(rpc_url)))
    }

    /// Reader over an arbitrary transport
    pub fn with_transport(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport: RwLock::new(transport),
            aggregator: MULTICALL3_ADDRESS,
            token: DAI_TOKEN_ADDRESS,
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Override the aggregator and token contracts
    pub fn with_contracts(mut self, aggregator: Address, token: Address) -> Self {
        self.aggregator = aggregator;
        self.token = token;
        self
    }

    /// Current transport handle; in-flight calls keep the handle they started with
    fn handle(&self) -> Arc<dyn RpcTransport> {
        self.transport
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Point subsequent calls at a new RPC endpoint
    pub fn set_endpoint(&self, rpc_url: &str) {
        log::info!("Re-pointing balance reader to {}", rpc_url);
        self.replace_transport(Arc::new(HttpRpc::new(rpc_url)));
    }

    /// Swap the transport handle used by subsequent calls
    pub fn replace_transport(&self, transport: Arc<dyn RpcTransport>) {
        let mut guard = self
            .transport
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = transport;
    }

    /// Endpoint of the current transport
    pub fn endpoint(&self) -> String {
        self.handle().endpoint()
    }

    /// Read balances for every address, keeping failed reads distinguishable
    pub async fn fetch_balance_reads(
        &self,
        addresses: &[Address],
    ) -> Result<HashMap<Address, BalanceRead>, TrackerError> {
        let mut reads = HashMap::new();
        if addresses.is_empty() {
            return Ok(reads);
        }

        let mut seen = HashSet::new();
        let unique: Vec<Address> = addresses
            .iter()
            .filter(|address| seen.insert(**address))
            .copied()
            .collect();

        let transport = self.handle();
        let chunk_count = unique.len().div_ceil(self.chunk_size);
        log::info!(
            "Fetching balances for {} addresses in {} chunk(s) via {}",
            unique.len(),
            chunk_count,
            transport.endpoint()
        );

        for (index, chunk) in unique.chunks(self.chunk_size).enumerate() {
            log::debug!("Chunk {}/{}: {} addresses", index + 1, chunk_count, chunk.len());

            let call_data = encode_balance_batch(self.token, chunk);
            let raw = transport.eth_call(self.aggregator, call_data).await?;
            let results = decode_batch_results(&raw)?;

            if results.len() != chunk.len() {
                return Err(TrackerError::DecodeFailed(format!(
                    "aggregate3 returned {} results for {} calls",
                    results.len(),
                    chunk.len()
                )));
            }

            for (address, result) in chunk.iter().zip(results.iter()) {
                let read = match decode_balance(result) {
                    Some(value) => BalanceRead::Confirmed(value),
                    None => {
                        log::debug!("Balance read failed for {}", address);
                        BalanceRead::Failed
                    }
                };
                reads.insert(*address, read);
            }
        }

        Ok(reads)
    }

    /// Read balances as human-readable amounts
    ///
    /// Failed per-address reads are reported as zero.
    pub async fn fetch_balances(
        &self,
        addresses: &[Address],
    ) -> Result<HashMap<Address, f64>, TrackerError> {
        let reads = self.fetch_balance_reads(addresses).await?;
        Ok(reads
            .into_iter()
            .map(|(address, read)| (address, from_wei(read.raw_or_zero())))
            .collect())
    }

    /// Latest block number, or 0 when the endpoint cannot be reached
    pub async fn fetch_block_height(&self) -> u64 {
        match self.handle().block_number().await {
            Ok(height) => height,
            Err(e) => {
                log::warn!("Could not read block height ({}), using 0", e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multicall::{aggregate3Call, balanceOfCall, Result3};
    use alloy_primitives::Bytes;
    use alloy_sol_types::{SolCall, SolValue};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers aggregate3 from a balance table and records batch sizes
    struct TableRpc {
        balances: HashMap<Address, U256>,
        reverting: HashSet<Address>,
        batches: Mutex<Vec<usize>>,
        fail_on_batch: Option<usize>,
        label: &'static str,
    }

    impl TableRpc {
        fn new(label: &'static str) -> Self {
            Self {
                balances: HashMap::new(),
                reverting: HashSet::new(),
                batches: Mutex::new(Vec::new()),
                fail_on_batch: None,
                label,
            }
        }
    }

    #[async_trait]
    impl RpcTransport for TableRpc {
        async fn eth_call(&self, _to: Address, data: Bytes) -> Result<Bytes, TrackerError> {
            let call = aggregate3Call::abi_decode(&data).unwrap();
            let batch_index = {
                let mut batches = self.batches.lock().unwrap();
                batches.push(call.calls.len());
                batches.len() - 1
            };
            if self.fail_on_batch == Some(batch_index) {
                return Err(TrackerError::connection_failed("connection reset"));
            }

            let results: Vec<Result3> = call
                .calls
                .iter()
                .map(|sub| {
                    let holder = balanceOfCall::abi_decode(&sub.callData).unwrap().account;
                    if self.reverting.contains(&holder) {
                        Result3 {
                            success: false,
                            returnData: Bytes::new(),
                        }
                    } else {
                        let value = self.balances.get(&holder).copied().unwrap_or_default();
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
            Err(TrackerError::connection_failed("offline"))
        }

        fn endpoint(&self) -> String {
            self.label.to_string()
        }
    }

    fn addresses(count: usize) -> Vec<Address> {
        (0..count)
            .map(|i| {
                let mut bytes = [0u8; 20];
                bytes[12..20].copy_from_slice(&(i as u64 + 1).to_be_bytes());
                Address::from(bytes)
            })
            .collect()
    }

    fn one_token() -> U256 {
        U256::from(10u64).pow(U256::from(18u64))
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let rpc = Arc::new(TableRpc::new("table"));
        let reader = ChainBalanceReader::with_transport(rpc.clone());

        let balances = reader.fetch_balances(&[]).await.unwrap();

        assert!(balances.is_empty());
        assert!(rpc.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chunks_250_addresses_into_three_calls() {
        let holders = addresses(250);
        let mut rpc = TableRpc::new("table");
        rpc.reverting.insert(holders[120]);
        for holder in &holders {
            rpc.balances.insert(*holder, one_token());
        }
        let rpc = Arc::new(rpc);
        let reader = ChainBalanceReader::with_transport(rpc.clone());

        let reads = reader.fetch_balance_reads(&holders).await.unwrap();

        assert_eq!(*rpc.batches.lock().unwrap(), vec![100, 100, 50]);
        assert_eq!(reads.len(), 250);
        assert_eq!(reads[&holders[120]], BalanceRead::Failed);
        assert_eq!(reads[&holders[119]], BalanceRead::Confirmed(one_token()));
        assert_eq!(reads[&holders[121]], BalanceRead::Confirmed(one_token()));
    }

    #[tokio::test]
    async fn test_failed_sub_call_maps_to_zero() {
        let holders = addresses(2);
        let mut rpc = TableRpc::new("table");
        rpc.balances.insert(holders[0], one_token());
        rpc.reverting.insert(holders[1]);
        let reader = ChainBalanceReader::with_transport(Arc::new(rpc));

        let balances = reader.fetch_balances(&holders).await.unwrap();

        assert_eq!(balances[&holders[0]], 1.0);
        assert_eq!(balances[&holders[1]], 0.0);
    }

    #[tokio::test]
    async fn test_chunk_failure_aborts_everything() {
        let holders = addresses(150);
        let mut rpc = TableRpc::new("table");
        rpc.fail_on_batch = Some(1);
        let reader = ChainBalanceReader::with_transport(Arc::new(rpc));

        let result = reader.fetch_balances(&holders).await;

        assert!(matches!(result, Err(TrackerError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_duplicates_are_read_once() {
        let holders = addresses(3);
        let input = vec![holders[0], holders[1], holders[0], holders[2]];
        let rpc = Arc::new(TableRpc::new("table"));
        let reader = ChainBalanceReader::with_transport(rpc.clone());

        let reads = reader.fetch_balance_reads(&input).await.unwrap();

        assert_eq!(reads.len(), 3);
        assert_eq!(*rpc.batches.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_block_height_failure_is_swallowed() {
        let reader = ChainBalanceReader::with_transport(Arc::new(TableRpc::new("table")));
        assert_eq!(reader.fetch_block_height().await, 0);
    }

    #[tokio::test]
    async fn test_replace_transport_repoints_reader() {
        let reader = ChainBalanceReader::with_transport(Arc::new(TableRpc::new("first")));
        assert_eq!(reader.endpoint(), "first");

        reader.replace_transport(Arc::new(TableRpc::new("second")));
        assert_eq!(reader.endpoint(), "second");

        reader.set_endpoint("http://localhost:8545");
        assert_eq!(reader.endpoint(), "http://localhost:8545");
    }
}
