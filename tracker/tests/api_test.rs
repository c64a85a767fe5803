//! Route tests for the tracker HTTP service
//!
//! The router runs in-process against a fake chain and an in-memory cache.

use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use dai_tracker::multicall::{aggregate3Call, balanceOfCall, Result3};
use dai_tracker::{
    Address, Bytes, ChainBalanceReader, MemoryCache, RpcTransport, StoreBackend, TrackerError,
    WalletStore, U256,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracker::api::server::router;
use tracker::summary::NO_KEY_MESSAGE;
use tracker::{AppState, SummaryClient};

const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

#[derive(Default)]
struct FakeChain {
    balances: Mutex<HashMap<Address, U256>>,
    offline: AtomicBool,
}

#[async_trait]
impl RpcTransport for FakeChain {
    async fn eth_call(&self, _to: Address, data: Bytes) -> Result<Bytes, TrackerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TrackerError::connection_failed("connection refused"));
        }
        let call = aggregate3Call::abi_decode(&data)
            .map_err(|e| TrackerError::DecodeFailed(e.to_string()))?;
        let balances = self.balances.lock().unwrap();
        let results: Vec<Result3> = call
            .calls
            .iter()
            .map(|sub| {
                let holder = balanceOfCall::abi_decode(&sub.callData).unwrap().account;
                let value = balances.get(&holder).copied().unwrap_or_default();
                Result3 {
                    success: true,
                    returnData: Bytes::from(value.abi_encode()),
                }
            })
            .collect();
        Ok(Bytes::from((results,).abi_encode_params()))
    }

    async fn block_number(&self) -> Result<u64, TrackerError> {
        Ok(60_000_000)
    }

    fn endpoint(&self) -> String {
        "fake://chain".to_string()
    }
}

struct Harness {
    chain: Arc<FakeChain>,
    state: Arc<AppState>,
}

impl Harness {
    fn new() -> Self {
        env_logger::builder().is_test(true).try_init().ok();
        let chain = Arc::new(FakeChain::default());
        let reader = Arc::new(ChainBalanceReader::with_transport(chain.clone()));
        let store = Arc::new(WalletStore::new(
            Arc::new(MemoryCache::new()),
            StoreBackend::LocalOnly,
        ));
        let summary = SummaryClient::new(None, "gemini-1.5-flash");
        let state = Arc::new(AppState::new(reader, store, summary));
        Self { chain, state }
    }

    fn app(&self) -> Router {
        router(self.state.clone())
    }

    fn set_balance(&self, address: &str, whole_tokens: u64) {
        let raw = U256::from(whole_tokens) * U256::from(10u64).pow(U256::from(18u64));
        self.chain
            .balances
            .lock()
            .unwrap()
            .insert(address.parse().unwrap(), raw);
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::new();
    let response = harness
        .app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_upload_then_list() {
    let harness = Harness::new();
    harness.set_balance(ALICE, 12);

    let text = format!("{}, Alice\n{} Bob\nnot an address", ALICE, BOB);
    let (status, body) = harness
        .send(Method::POST, "/api/wallets/upload", Some(json!({ "text": text })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["registered"], 2);
    assert_eq!(body["wallets"][0]["owner"], "Alice");
    assert_eq!(body["wallets"][0]["initialBalance"], 12.0);
    assert_eq!(body["wallets"][0]["initialBlock"], 60_000_000);
    assert_eq!(body["wallets"][1]["currentBalance"], 0.0);

    let (status, listed) = harness.send(Method::GET, "/api/wallets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, body["wallets"]);
}

#[tokio::test]
async fn test_upload_without_addresses_is_rejected() {
    let harness = Harness::new();

    let (status, body) = harness
        .send(
            Method::POST,
            "/api/wallets/upload",
            Some(json!({ "text": "nothing to see here" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no valid addresses"));
}

#[tokio::test]
async fn test_sync_updates_balances_and_status() {
    let harness = Harness::new();
    harness.set_balance(ALICE, 1);
    harness
        .send(
            Method::POST,
            "/api/wallets/upload",
            Some(json!({ "text": ALICE })),
        )
        .await;

    harness.set_balance(ALICE, 5);
    let (status, body) = harness.send(Method::POST, "/api/sync", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["currentBalance"], 5.0);
    assert_eq!(body[0]["initialBalance"], 1.0);

    let (_, status_body) = harness.send(Method::GET, "/api/status", None).await;
    assert_eq!(status_body["walletCount"], 1);
    assert_eq!(status_body["syncing"], false);
    assert_eq!(status_body["remoteEnabled"], false);
    assert_eq!(status_body["rpcEndpoint"], "fake://chain");
    assert!(status_body["lastSync"].is_string());
}

#[tokio::test]
async fn test_sync_failure_is_bad_gateway() {
    let harness = Harness::new();
    harness
        .send(
            Method::POST,
            "/api/wallets/upload",
            Some(json!({ "text": ALICE })),
        )
        .await;

    harness.chain.offline.store(true, Ordering::SeqCst);
    let (status, body) = harness.send(Method::POST, "/api/sync", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
    assert!(!harness.state.is_syncing());

    let (_, status_body) = harness.send(Method::GET, "/api/status", None).await;
    assert!(status_body["lastSync"].is_null());
}

#[tokio::test]
async fn test_rpc_settings_round_trip() {
    let harness = Harness::new();

    let (_, before) = harness.send(Method::GET, "/api/settings/rpc", None).await;
    assert_eq!(before["url"], "fake://chain");

    let (status, _) = harness
        .send(
            Method::PUT,
            "/api/settings/rpc",
            Some(json!({ "url": "http://localhost:8545" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = harness.send(Method::GET, "/api/settings/rpc", None).await;
    assert_eq!(after["url"], "http://localhost:8545");
    assert_eq!(
        harness.state.store.rpc_endpoint().as_deref(),
        Some("http://localhost:8545")
    );
}

#[tokio::test]
async fn test_rpc_settings_rejects_non_http_url() {
    let harness = Harness::new();

    let (status, _) = harness
        .send(
            Method::PUT,
            "/api/settings/rpc",
            Some(json!({ "url": "ws://localhost:8546" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.state.reader.endpoint(), "fake://chain");
}

#[tokio::test]
async fn test_summary_without_key() {
    let harness = Harness::new();

    let (status, body) = harness.send(Method::GET, "/api/summary", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], NO_KEY_MESSAGE);
}
