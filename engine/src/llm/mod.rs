//! Generation backends
//!
//! Every backend is reached through the [`LLMProvider`] trait. Pipeline stages
//! never talk to a backend directly; they go through
//! [`crate::pipeline::Generator`], which adds the per-stage timeout and maps
//! [`LLMError`] into the pipeline error type.
//!
//! Adapters only have to implement [`LLMProvider::complete`]. Tool-call
//! detection and single-chunk streaming come from the trait defaults; the
//! Ollama and OpenAI adapters override `generate_stream` with real streaming.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::secrets::SecretManager;

pub mod anthropic;
pub mod factory;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod stream_decode;

pub use factory::provider_from_config;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Incremental text chunks from a streaming call
pub type TextStream = BoxStream<'static, Result<String>>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Response from an LLM provider, after tool-call detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LLMResponse {
    ToolCall(ToolCall),
    FinalAnswer(FinalAnswer),
}

impl LLMResponse {
    /// Classify raw completion text
    pub fn from_text(content: String) -> Self {
        match parse_tool_calls(&content) {
            Some(tool_call) => LLMResponse::ToolCall(tool_call),
            None => LLMResponse::FinalAnswer(FinalAnswer::new(content)),
        }
    }
}

/// Tool call request from the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Final answer from the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub content: String,
}

impl FinalAnswer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// LLM Provider trait that all backends implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Backend name as used in config (e.g., "ollama", "openai")
    fn name(&self) -> &str;

    /// True for backends running on this machine
    fn is_local(&self) -> bool;

    /// Run one completion and return the raw assistant text
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Run one completion and classify it as a tool call or a final answer
    async fn generate(&self, messages: &[Message]) -> Result<LLMResponse> {
        let content = self.complete(messages).await?;
        Ok(LLMResponse::from_text(content))
    }

    /// Stream one completion as text chunks
    ///
    /// The default yields the whole completion as a single chunk.
    async fn generate_stream(&self, messages: &[Message]) -> Result<TextStream> {
        let content = self.complete(messages).await?;
        Ok(stream::once(async move { Ok(content) }).boxed())
    }

    /// Check if the backend is currently reachable and configured
    async fn check_health(&self) -> bool {
        true
    }
}

/// Map a transport failure from reqwest
pub(crate) fn map_request_error(e: reqwest::Error, provider: &str, base_url: &str) -> LLMError {
    if e.is_timeout() {
        LLMError::Timeout
    } else if e.is_connect() {
        LLMError::ProviderUnavailable(format!(
            "Cannot connect to {} at {}",
            provider, base_url
        ))
    } else {
        LLMError::NetworkError(SecretManager::scrub(&e.to_string()))
    }
}

/// Map a non-success HTTP status and its body
pub(crate) fn map_status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> LLMError {
    let body = SecretManager::scrub(body);
    match status.as_u16() {
        401 | 403 => LLMError::AuthenticationFailed(body),
        429 => LLMError::RateLimitExceeded,
        400 | 404 | 422 => LLMError::InvalidRequest(body),
        _ => LLMError::ProviderUnavailable(format!("{} API error ({}): {}", provider, status, body)),
    }
}

/// Shared HTTP client settings for all adapters
///
/// No overall request timeout: each stage bounds its own call.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Detect a deck tool call in completion text.
///
/// Accepted shapes, tried in order:
/// 1. The whole text is `{"function": "...", "arguments": {...}}`
/// 2. The same object inside the first code fence, prose after it allowed
/// 3. `<tool_call>name({...})</tool_call>` markers
/// 4. A `{"function":` object embedded in prose
pub fn parse_tool_calls(content: &str) -> Option<ToolCall> {
    let trimmed = content.trim();

    function_call(trimmed)
        .or_else(|| fenced_body(trimmed).and_then(|body| function_call(body.trim())))
        .or_else(|| marker_call(trimmed))
        .or_else(|| {
            let start = trimmed.find("{\"function\"")?;
            leading_function_call(&trimmed[start..])
        })
}

/// Wire shape of a JSON tool call
#[derive(Deserialize)]
struct FunctionCall {
    function: String,
    arguments: serde_json::Value,
}

impl From<FunctionCall> for ToolCall {
    fn from(call: FunctionCall) -> Self {
        ToolCall::new(new_call_id(), call.function, call.arguments.to_string())
    }
}

fn new_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4())
}

/// The whole text is one function call object
fn function_call(text: &str) -> Option<ToolCall> {
    serde_json::from_str::<FunctionCall>(text).ok().map(Into::into)
}

/// A function call object at the start of `text`, anything after it ignored
fn leading_function_call(text: &str) -> Option<ToolCall> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<FunctionCall>()
        .next()?
        .ok()
        .map(Into::into)
}

/// Body of the first code fence, skipping its info string line
fn fenced_body(text: &str) -> Option<&str> {
    let (_, after_open) = text.split_once("```")?;
    let (_, body_and_rest) = after_open.split_once('\n')?;
    let (body, _) = body_and_rest.split_once("```")?;
    (!body.trim().is_empty()).then_some(body)
}

/// `<tool_call>name(args)</tool_call>`
fn marker_call(text: &str) -> Option<ToolCall> {
    let (_, after_open) = text.split_once("<tool_call>")?;
    let (inner, _) = after_open.split_once("</tool_call>")?;
    let (name, rest) = inner.split_once('(')?;
    let arguments = rest.rsplit_once(')').map_or(rest, |(args, _)| args);
    Some(ToolCall::new(new_call_id(), name.trim(), arguments.trim()))
}
