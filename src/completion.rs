// src/completion.rs - Chat-completion client behind an injectable seam

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Seam over the hosted completion endpoint so the checker can be
/// exercised against canned responses in tests.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends a system + user message pair and returns the raw answer text.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

pub struct OpenAiClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            api_key,
            model,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "max_tokens": self.max_tokens
        });

        // No retry and no custom timeout: a hung call rides on reqwest's
        // own defaults and surfaces as a plain error for this check.
        let res = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            return Err(anyhow!("Completion request failed: {} - {}", status, err_text));
        }

        let body: Value = res.json().await?;
        extract_text(&body).context("No text in completion response")
    }
}

fn extract_text(body: &Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_reads_first_choice() {
        let body = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "〇〇ダイニング がおすすめです" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        assert_eq!(
            extract_text(&body).as_deref(),
            Some("〇〇ダイニング がおすすめです")
        );
    }

    #[test]
    fn test_extract_text_rejects_malformed_body() {
        assert!(extract_text(&json!({ "choices": [] })).is_none());
        assert!(extract_text(&json!({ "error": { "message": "quota" } })).is_none());
        assert!(extract_text(&json!({ "choices": [{ "message": { "content": 42 } }] })).is_none());
    }
}
