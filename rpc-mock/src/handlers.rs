/// Axum HTTP handlers for the JSON-RPC endpoint and mock controls

use alloy_primitives::{hex, Address, Bytes, U256};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

use crate::state::{MockChain, CHAIN_ID};
use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockChain>;

/// Error type for the control endpoints
pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, message).into_response()
    }
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// POST /
/// Single JSON-RPC request; faults are reported inside the envelope with HTTP 200
pub async fn json_rpc(
    State(chain): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    log::debug!("JSON-RPC {}", req.method);
    let response = match dispatch(&chain, &req.method, &req.params) {
        Ok(result) => JsonRpcResponse::success(req.id, result),
        Err(fault) => {
            log::info!("JSON-RPC {} failed: {}", req.method, fault);
            JsonRpcResponse::failure(req.id, fault)
        }
    };
    Json(response)
}

fn dispatch(chain: &MockChain, method: &str, params: &Value) -> Result<Value, RpcFault> {
    match method {
        "eth_blockNumber" => Ok(json!(format!("0x{:x}", chain.block_number()))),
        "eth_chainId" => Ok(json!(format!("0x{:x}", CHAIN_ID))),
        "eth_call" => {
            let (to, data) = call_params(params)?;
            let output = chain.call(to, &data)?;
            Ok(json!(hex::encode_prefixed(&output)))
        }
        other => Err(RpcFault::method_not_found(other)),
    }
}

/// Extract `to` and `data` (or `input`) from eth_call params
fn call_params(params: &Value) -> Result<(Address, Bytes), RpcFault> {
    let tx = params
        .get(0)
        .ok_or_else(|| RpcFault::invalid_params("missing call object"))?;

    let to = tx
        .get("to")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcFault::invalid_params("missing 'to'"))?;
    let to = Address::from_str(to)
        .map_err(|e| RpcFault::invalid_params(format!("bad 'to' {}: {}", to, e)))?;

    let data = tx
        .get("data")
        .or_else(|| tx.get("input"))
        .and_then(Value::as_str)
        .unwrap_or("0x");
    let data = Bytes::from_str(data)
        .map_err(|e| RpcFault::invalid_params(format!("bad call data: {}", e)))?;

    Ok((to, data))
}

/// POST /mock/balances
/// Body maps addresses to decimal wei strings
pub async fn set_balances(
    State(chain): State<AppState>,
    Json(req): Json<BalancesRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let parsed = parse_balances(&req).map_err(ApiError::BadRequest)?;
    let updated = parsed.len();
    for (holder, raw) in parsed {
        chain.set_balance(holder, raw);
    }
    log::info!("💰 Set {} balance(s)", updated);
    Ok(Json(UpdatedResponse { updated }))
}

/// POST /mock/failing
/// Marks addresses whose balanceOf reverts
pub async fn set_failing(
    State(chain): State<AppState>,
    Json(req): Json<FailingRequest>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let holders = req
        .addresses
        .iter()
        .map(|address| {
            Address::from_str(address.trim())
                .map_err(|e| ApiError::BadRequest(format!("bad address {}: {}", address, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    for holder in &holders {
        chain.mark_failing(*holder);
    }
    log::info!("⛔ Marked {} address(es) as failing", holders.len());
    Ok(Json(UpdatedResponse {
        updated: holders.len(),
    }))
}

/// GET /mock/batches
pub async fn get_batches(State(chain): State<AppState>) -> Json<BatchesResponse> {
    Json(BatchesResponse {
        batches: chain.batches(),
    })
}

/// Parse an address -> decimal wei table
pub fn parse_balances(table: &BalancesRequest) -> Result<Vec<(Address, U256)>, String> {
    table
        .iter()
        .map(|(address, wei)| {
            let holder = Address::from_str(address.trim())
                .map_err(|e| format!("bad address {}: {}", address, e))?;
            let raw = U256::from_str_radix(wei.trim(), 10)
                .map_err(|e| format!("bad balance for {}: {}", address, e))?;
            Ok((holder, raw))
        })
        .collect()
}
