use super::{
    http_client, map_request_error, map_status_error, LLMError, LLMProvider, Message,
    MessageRole, Result,
};
use crate::config::GeminiConfig;
use crate::secrets::{SecretCache, SecretString};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const API_KEY_NAME: &str = "gemini_api_key";

pub struct GeminiProvider {
    config: GeminiConfig,
    secret_cache: Arc<SecretCache>,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig, secret_cache: Arc<SecretCache>) -> Self {
        Self {
            config,
            secret_cache,
            client: http_client(),
        }
    }

    fn api_key(&self) -> Result<SecretString> {
        self.secret_cache
            .get_secret(API_KEY_NAME)
            .map_err(|e| LLMError::AuthenticationFailed(e.to_string()))?
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                LLMError::AuthenticationFailed(
                    "No API key found. Set GEMINI_API_KEY or run `slidewright secret set gemini_api_key`"
                        .to_string(),
                )
            })
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn check_health(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let api_key = self.api_key()?;
        let base_url = self.config.base_url.trim_end_matches('/');
        let url = format!("{}/models/{}:generateContent", base_url, self.config.model);

        let mut contents = Vec::new();
        let mut system_text = String::new();

        for msg in messages {
            if msg.role == MessageRole::System {
                system_text.push_str(&msg.content);
                system_text.push('\n');
                continue;
            }

            contents.push(json!({
                "role": if msg.role == MessageRole::Assistant { "model" } else { "user" },
                "parts": [{"text": msg.content}]
            }));
        }

        let mut payload = serde_json::Map::new();
        payload.insert("contents".to_string(), json!(contents));

        if !system_text.is_empty() {
            payload.insert(
                "systemInstruction".to_string(),
                json!({ "parts": [{"text": system_text.trim_end()}] }),
            );
        }

        // Key in a header keeps it out of URLs that reqwest may echo in errors
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_request_error(e, "Gemini", base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(map_status_error("Gemini", status, &text));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let parts = data
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| LLMError::ParseError("No candidate parts in response".to_string()))?;

        let full_text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();

        Ok(full_text)
    }
}
