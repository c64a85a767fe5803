use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::TrackerError;

/// Shared document store reachable over the network
///
/// Each key holds one opaque JSON document. A missing key is `Ok(None)`,
/// never an error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Option<Value>, TrackerError>;

    async fn upsert(&self, key: &str, value: Value) -> Result<(), TrackerError>;
}

/// Key/value table behind a PostgREST-style HTTP API
///
/// Expects a table with a text primary key `key` and a JSON column `value`.
pub struct RestDocumentStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RestDocumentStore {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait]
impl RemoteStore for RestDocumentStore {
    async fn fetch(&self, key: &str) -> Result<Option<Value>, TrackerError> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("key", format!("eq.{}", key)), ("select", "value".to_string())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| TrackerError::remote(format!("fetch {}: {}", key, e)))?;

        if !response.status().is_success() {
            return Err(TrackerError::remote(format!(
                "fetch {}: HTTP {}",
                key,
                response.status()
            )));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| TrackerError::remote(format!("fetch {}: malformed body: {}", key, e)))?;

        Ok(rows
            .into_iter()
            .next()
            .and_then(|mut row| row.get_mut("value").map(Value::take))
            .filter(|value| !value.is_null()))
    }

    async fn upsert(&self, key: &str, value: Value) -> Result<(), TrackerError> {
        let response = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "key")])
            .header("apikey", &self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .bearer_auth(&self.api_key)
            .json(&json!({ "key": key, "value": value }))
            .send()
            .await
            .map_err(|e| TrackerError::remote(format!("upsert {}: {}", key, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::remote(format!(
                "upsert {}: HTTP {} {}",
                key, status, body
            )));
        }

        Ok(())
    }
}
