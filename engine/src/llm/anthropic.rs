use super::{
    http_client, map_request_error, map_status_error, LLMError, LLMProvider, Message,
    MessageRole, Result,
};
use crate::config::AnthropicConfig;
use crate::secrets::{SecretCache, SecretString};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const API_KEY_NAME: &str = "anthropic_api_key";

pub struct AnthropicProvider {
    config: AnthropicConfig,
    secret_cache: Arc<SecretCache>,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig, secret_cache: Arc<SecretCache>) -> Self {
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
                    "No API key found. Set ANTHROPIC_API_KEY or run `slidewright secret set anthropic_api_key`"
                        .to_string(),
                )
            })
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn check_health(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/messages", self.config.base_url.trim_end_matches('/'));

        // System text goes in its own field; tool results ride as user turns
        let mut system_prompt = String::new();
        let mut api_messages = Vec::new();
        for msg in messages {
            if msg.role == MessageRole::System {
                system_prompt.push_str(&msg.content);
                system_prompt.push('\n');
                continue;
            }
            api_messages.push(json!({
                "role": if msg.role == MessageRole::Assistant { "assistant" } else { "user" },
                "content": msg.content
            }));
        }

        let payload = json!({
            "model": self.config.model,
            "max_tokens": 8192,
            "system": system_prompt.trim_end(),
            "messages": api_messages,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key.expose())
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_request_error(e, "Anthropic", &self.config.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(map_status_error("Anthropic", status, &text));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let content_arr = data
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| LLMError::ParseError("No content array in response".to_string()))?;

        let full_content: String = content_arr
            .iter()
            .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
            .collect();

        Ok(full_content)
    }
}
