//! JSON-RPC transport to an EVM read endpoint

use alloy_primitives::{hex, Address, Bytes};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::str::FromStr;

use crate::error::TrackerError;

/// Read-only calls the balance reader needs from a chain endpoint
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// `eth_call` against the latest block
    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, TrackerError>;

    /// Latest block number
    async fn block_number(&self) -> Result<u64, TrackerError>;

    /// Endpoint description for logs and status
    fn endpoint(&self) -> String;
}

/// HTTP JSON-RPC 2.0 client
pub struct HttpRpc {
    client: reqwest::Client,
    url: String,
}

impl HttpRpc {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TrackerError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TrackerError::connection_failed(format!("{} ({}): {}", method, self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::connection_failed(format!(
                "{} ({}): HTTP {}",
                method, self.url, status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TrackerError::InvalidResponse(format!("{}: {}", method, e)))?;

        parse_rpc_body(body)
    }
}

/// Extract `result` from a JSON-RPC response, surfacing `error` objects
fn parse_rpc_body(body: Value) -> Result<Value, TrackerError> {
    if let Some(err) = body.get("error") {
        return Err(TrackerError::RpcError {
            code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    body.get("result")
        .cloned()
        .ok_or_else(|| TrackerError::InvalidResponse("RPC response missing result".to_string()))
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_quantity(value: &str) -> Result<u64, TrackerError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| TrackerError::InvalidResponse(format!("not a hex quantity: {}", value)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| TrackerError::InvalidResponse(format!("bad quantity {}: {}", value, e)))
}

#[async_trait]
impl RpcTransport for HttpRpc {
    async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, TrackerError> {
        let params = json!([
            {
                "to": hex::encode_prefixed(to.as_slice()),
                "data": hex::encode_prefixed(&data),
            },
            "latest"
        ]);
        let result = self.request("eth_call", params).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| TrackerError::InvalidResponse("eth_call returned non-string result".to_string()))?;
        Bytes::from_str(raw)
            .map_err(|e| TrackerError::InvalidResponse(format!("eth_call result is not hex: {}", e)))
    }

    async fn block_number(&self) -> Result<u64, TrackerError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        let quantity = result
            .as_str()
            .ok_or_else(|| TrackerError::InvalidResponse("eth_blockNumber returned non-string result".to_string()))?;
        parse_quantity(quantity)
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}
