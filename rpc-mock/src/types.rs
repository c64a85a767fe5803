/// JSON-RPC envelope and control endpoint types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// Method not found
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters
pub const INVALID_PARAMS: i64 = -32602;
/// Generic execution failure, as returned by geth-style nodes
pub const EXECUTION_ERROR: i64 = -32000;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcFault>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, fault: RpcFault) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(fault),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("JSON-RPC error {code}: {message}")]
pub struct RpcFault {
    pub code: i64,
    pub message: String,
}

impl RpcFault {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: METHOD_NOT_FOUND,
            message: format!("the method {} does not exist/is not available", method),
        }
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: msg.into(),
        }
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self {
            code: EXECUTION_ERROR,
            message: msg.into(),
        }
    }
}

/// POST /mock/balances body: address -> balance in wei, as a decimal string
pub type BalancesRequest = HashMap<String, String>;

/// POST /mock/failing body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FailingRequest {
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdatedResponse {
    pub updated: usize,
}

/// GET /mock/batches response: sub-call count of every aggregate3 answered
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchesResponse {
    pub batches: Vec<usize>,
}
