//! Ollama LLM Provider
//!
//! Ollama runs models locally, typically at http://localhost:11434.
//! No API key is needed. Streaming uses newline-delimited JSON from
//! `/api/chat` with `"stream": true`.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::stream_decode::{decode_lines, LineEvent};
use super::{
    http_client, map_request_error, map_status_error, LLMError, LLMProvider, Message,
    MessageRole, Result, TextStream,
};

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaProvider {
    /// # Arguments
    /// * `base_url` - Base URL for Ollama API (e.g., "http://localhost:11434")
    /// * `model` - Model name to use (e.g., "llama3.1:8b")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: http_client(),
        }
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|msg| OllamaMessage {
                role: match msg.role {
                    MessageRole::User => "user".to_string(),
                    MessageRole::Assistant => "assistant".to_string(),
                    MessageRole::System => "system".to_string(),
                },
                content: msg.content.clone(),
            })
            .collect()
    }

    async fn post_chat(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response> {
        let ollama_messages = self.convert_messages(messages);

        tracing::debug!(
            "Ollama request: model={}, messages={}, total_chars={}, stream={}",
            self.model,
            ollama_messages.len(),
            ollama_messages
                .iter()
                .map(|m| m.content.len())
                .sum::<usize>(),
            stream
        );

        let request = OllamaRequest {
            model: self.model.clone(),
            messages: ollama_messages,
            stream,
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_request_error(e, "Ollama", &self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error("Ollama", status, &error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let start = std::time::Instant::now();
        let response = self.post_chat(messages, false).await?;

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::info!(
            "Ollama response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        Ok(ollama_response.message.content)
    }

    async fn generate_stream(&self, messages: &[Message]) -> Result<TextStream> {
        let response = self.post_chat(messages, true).await?;
        let base_url = self.base_url.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| map_request_error(e, "Ollama", &base_url)));

        Ok(decode_lines(body, decode_ndjson_line))
    }

    async fn check_health(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Ollama health check failed: {}", e);
                false
            }
        }
    }
}

/// Decode one NDJSON line from a streaming `/api/chat` response
fn decode_ndjson_line(line: &str) -> LineEvent {
    let line = line.trim();
    if line.is_empty() {
        return LineEvent::Skip;
    }

    let chunk: OllamaStreamChunk = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            return LineEvent::Fail(LLMError::ParseError(format!(
                "Invalid Ollama stream line: {}",
                e
            )))
        }
    };

    if let Some(error) = chunk.error {
        return LineEvent::Fail(LLMError::InvalidRequest(error));
    }

    let text = chunk.message.map(|m| m.content).unwrap_or_default();
    if chunk.done {
        // The final line may still carry a last delta
        return if text.is_empty() {
            LineEvent::Done
        } else {
            LineEvent::Text(text)
        };
    }

    LineEvent::Text(text)
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_properties() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3.1:8b");

        assert_eq!(provider.name(), "ollama");
        assert!(provider.is_local());
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_message_conversion() {
        let provider = OllamaProvider::new("http://localhost:11434", "llama3.1:8b");

        let messages = vec![
            Message::system("You are a slide writer"),
            Message::user("Hello"),
            Message::assistant("Hi there"),
        ];

        let ollama_messages = provider.convert_messages(&messages);

        assert_eq!(ollama_messages.len(), 3);
        assert_eq!(ollama_messages[0].role, "system");
        assert_eq!(ollama_messages[1].role, "user");
        assert_eq!(ollama_messages[2].role, "assistant");
    }

    #[test]
    fn test_decode_ndjson_delta() {
        let line = r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#;
        assert!(matches!(decode_ndjson_line(line), LineEvent::Text(t) if t == "Hel"));
    }

    #[test]
    fn test_decode_ndjson_done() {
        let line = r#"{"message":{"role":"assistant","content":""},"done":true}"#;
        assert!(matches!(decode_ndjson_line(line), LineEvent::Done));
    }

    #[test]
    fn test_decode_ndjson_error() {
        let line = r#"{"error":"model 'nope' not found"}"#;
        assert!(matches!(
            decode_ndjson_line(line),
            LineEvent::Fail(LLMError::InvalidRequest(_))
        ));
    }
}
