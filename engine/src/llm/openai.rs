use super::stream_decode::{decode_lines, LineEvent};
use super::{
    http_client, map_request_error, map_status_error, LLMError, LLMProvider, Message, Result,
    TextStream,
};
use crate::config::{OpenAICompatibleConfig, OpenAIConfig};
use crate::secrets::{env_var_for, SecretCache, SecretString};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;

/// Adapter for the OpenAI chat completions protocol
///
/// Also serves any OpenAI-compatible server; such servers may run without a key.
pub struct OpenAIProvider {
    name: String,
    base_url: String,
    model: String,
    key_name: &'static str,
    key_required: bool,
    secret_cache: Arc<SecretCache>,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: &OpenAIConfig, secret_cache: Arc<SecretCache>) -> Self {
        Self {
            name: "openai".to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            key_name: "openai_api_key",
            key_required: true,
            secret_cache,
            client: http_client(),
        }
    }

    pub fn compatible(config: &OpenAICompatibleConfig, secret_cache: Arc<SecretCache>) -> Self {
        Self {
            name: "openai_compatible".to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            key_name: "openai_compatible_api_key",
            key_required: false,
            secret_cache,
            client: http_client(),
        }
    }

    fn api_key(&self) -> Result<Option<SecretString>> {
        let key = self
            .secret_cache
            .get_secret(self.key_name)
            .map_err(|e| LLMError::AuthenticationFailed(e.to_string()))?;

        match key {
            Some(key) if !key.is_empty() => Ok(Some(key)),
            _ if self.key_required => Err(LLMError::AuthenticationFailed(format!(
                "No API key found. Set {} or run `slidewright secret set {}`",
                env_var_for(self.key_name),
                self.key_name
            ))),
            _ => Ok(None),
        }
    }

    async fn post_completion(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.base_url);

        let api_messages: Vec<_> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        let payload = json!({
            "model": self.model,
            "messages": api_messages,
            "stream": stream,
        });

        tracing::debug!(
            "{} request: model={}, messages={}, stream={}",
            self.name,
            self.model,
            api_messages.len(),
            stream
        );

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload);
        if let Some(key) = api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_request_error(e, &self.name, &self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(map_status_error(&self.name, status, &text));
        }

        Ok(response)
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn check_health(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let response = self.post_completion(messages, false).await?;

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| LLMError::ParseError("Empty content".to_string()))
    }

    async fn generate_stream(&self, messages: &[Message]) -> Result<TextStream> {
        let response = self.post_completion(messages, true).await?;
        let name = self.name.clone();
        let base_url = self.base_url.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| map_request_error(e, &name, &base_url)));

        Ok(decode_lines(body, decode_sse_line))
    }
}

/// Decode one server-sent event line from a streaming completion
fn decode_sse_line(line: &str) -> LineEvent {
    let Some(data) = line.strip_prefix("data:") else {
        // Blank separators, comments, and event/id fields
        return LineEvent::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return LineEvent::Done;
    }

    let event: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => return LineEvent::Fail(LLMError::ParseError(format!("Invalid SSE data: {}", e))),
    };

    if let Some(error) = event.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("stream error");
        return LineEvent::Fail(LLMError::InvalidRequest(message.to_string()));
    }

    let delta = event
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default();

    LineEvent::Text(delta.to_string())
}
