//! Narrative summary of the tracked wallets
//!
//! One Gemini `generateContent` call per request. Every failure path
//! returns a fixed message instead of an error.

pub mod types;

use dai_tracker::WalletRecord;
use std::fmt::Write;

use types::{
    GeminiContent, GeminiGenerationConfig, GeminiPart, GeminiRequest, GeminiResponse,
    GeminiSystemInstruction,
};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const NO_KEY_MESSAGE: &str =
    "Narrative summaries are disabled. Set GEMINI_API_KEY to enable them.";
pub const NO_WALLETS_MESSAGE: &str =
    "No wallets are tracked yet. Upload a list of addresses to get started.";
pub const FALLBACK_MESSAGE: &str =
    "A summary could not be generated right now. The balances shown are still current.";

const SYSTEM_PROMPT: &str = "You are a concise financial assistant. Summarize DAI stablecoin \
holdings for a small team in two or three plain sentences. Mention the total, the largest \
holders and any notable changes. Do not give investment advice.";

pub struct SummaryClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl SummaryClient {
    pub fn new(api_key: Option<String>, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    /// Point requests at a different API host
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Summarize the collection, never failing
    pub async fn summarize(&self, wallets: &[WalletRecord]) -> String {
        let Some(api_key) = &self.api_key else {
            return NO_KEY_MESSAGE.to_string();
        };
        if wallets.is_empty() {
            return NO_WALLETS_MESSAGE.to_string();
        }

        match self.generate(api_key, &build_prompt(wallets)).await {
            Ok(text) => text,
            Err(reason) => {
                log::warn!("Summary generation failed: {}", reason);
                FALLBACK_MESSAGE.to_string()
            }
        }
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
                role: Some("user".to_string()),
            }],
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            }),
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: Some(256),
                temperature: Some(0.4),
            }),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| format!("malformed response: {}", e))?;

        body.first_text()
            .ok_or_else(|| "response had no candidate text".to_string())
    }
}

/// Prompt listing the total, count and each wallet's balance and change
pub fn build_prompt(wallets: &[WalletRecord]) -> String {
    let total: f64 = wallets.iter().map(|w| w.current_balance).sum();

    let mut prompt = String::new();
    let _ = writeln!(prompt, "Total tracked balance: {:.2} DAI", total);
    let _ = writeln!(prompt, "Wallet count: {}", wallets.len());
    let _ = writeln!(prompt, "Wallets:");
    for wallet in wallets {
        let label = if wallet.owner.is_empty() {
            "(unlabelled)"
        } else {
            wallet.owner.as_str()
        };
        let _ = writeln!(
            prompt,
            "- {} {}: {:.2} DAI, change over last {} day(s): {:+.2} DAI",
            label,
            wallet.address,
            wallet.current_balance,
            wallet.history.len(),
            wallet.history_change()
        );
    }
    prompt
}
