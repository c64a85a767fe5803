//! Aggregator contract bindings
//!
//! Multicall3 `aggregate3` batches many `balanceOf` reads into a single
//! `eth_call`. Every sub-call allows individual failure.

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::error::TrackerError;

/// Multicall3, deployed at the same address on every EVM chain
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// DAI (PoS) on Polygon
pub const DAI_TOKEN_ADDRESS: Address = address!("8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063");

/// Maximum addresses per aggregated call
pub const CHUNK_SIZE: usize = 100;

sol! {
    struct Call3 {
        address target;
        bool allowFailure;
        bytes callData;
    }

    struct Result3 {
        bool success;
        bytes returnData;
    }

    function aggregate3(Call3[] calls) external payable returns (Result3[] returnData);

    function balanceOf(address account) external view returns (uint256);
}

/// Encode one `aggregate3` call reading `token.balanceOf(holder)` per holder
pub fn encode_balance_batch(token: Address, holders: &[Address]) -> Bytes {
    let calls = holders
        .iter()
        .map(|holder| Call3 {
            target: token,
            allowFailure: true,
            callData: Bytes::from(balanceOfCall { account: *holder }.abi_encode()),
        })
        .collect();

    Bytes::from(aggregate3Call { calls }.abi_encode())
}

/// Decode the raw `aggregate3` return data
pub fn decode_batch_results(data: &[u8]) -> Result<Vec<Result3>, TrackerError> {
    aggregate3Call::abi_decode_returns(data)
        .map_err(|e| TrackerError::DecodeFailed(format!("aggregate3 returns: {}", e)))
}

/// Decode one sub-call result into a raw balance
///
/// `None` when the sub-call failed or returned something that is not a uint256.
pub fn decode_balance(result: &Result3) -> Option<U256> {
    if !result.success {
        return None;
    }
    balanceOfCall::abi_decode_returns(&result.returnData).ok()
}
