//! Chat loop
//!
//! One user turn runs up to `max_rounds` generation rounds:
//!
//! 1. Build the system prompt from the live deck, then append history
//! 2. Stream the reply through the [`StreamGate`]
//! 3. Tool call: dispatch it, record the result, and go again
//! 4. Final answer: record it and return
//!
//! A turn that never reaches a final answer fails with a round budget
//! timeout. History from the failed turn is kept.

use std::sync::Arc;

use futures::StreamExt;
use sdk::errors::{Budget, PipelineError, Stage};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::document::DeckDocument;
use super::gate::StreamGate;
use super::tools::DeckTools;
use super::WorkingMemory;
use crate::llm::{LLMError, LLMProvider, LLMResponse, Message};

const CHAT_PREAMBLE: &str = "You are a presentation editor working on a Slidev deck. \
Answer questions about the deck, and edit it with the tools below when asked. \
Call at most one tool per reply. When you are done editing, reply in plain prose.";

/// Tool call made during a turn
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: String,
    pub result: String,
}

/// Outcome of one user turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub answer: String,
    pub rounds: usize,
    pub tool_calls: Vec<ToolInvocation>,
}

pub struct ChatAssistant {
    provider: Arc<dyn LLMProvider>,
    tools: DeckTools,
    memory: WorkingMemory,
    max_rounds: usize,
}

impl ChatAssistant {
    pub fn new(provider: Arc<dyn LLMProvider>, document: DeckDocument, max_rounds: usize) -> Self {
        Self {
            provider,
            tools: DeckTools::new(document),
            memory: WorkingMemory::new(),
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn document(&self) -> &DeckDocument {
        self.tools.document()
    }

    pub fn into_document(self) -> DeckDocument {
        self.tools.into_document()
    }

    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }

    /// Run one user turn
    ///
    /// Prose is streamed to `sink` as it arrives; tool-call text never is.
    pub async fn send(
        &mut self,
        text: &str,
        sink: Option<mpsc::Sender<String>>,
    ) -> Result<ChatReply, PipelineError> {
        self.memory.add_message(Message::user(text));
        let mut tool_calls = Vec::new();

        for round in 1..=self.max_rounds {
            let mut messages = vec![Message::system(format!(
                "{}\n\n{}",
                CHAT_PREAMBLE,
                self.tools.system_prompt()
            ))];
            messages.extend_from_slice(self.memory.messages());

            debug!(round, history = self.memory.messages().len(), "Chat round started");

            let mut stream = self
                .provider
                .generate_stream(&messages)
                .await
                .map_err(chat_error)?;

            let mut gate = StreamGate::new(sink.clone());
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(chat_error)?;
                gate.push(&chunk).await;
            }

            let response = LLMResponse::from_text(gate.text().to_string());
            let is_tool_call = matches!(response, LLMResponse::ToolCall(_));
            let full_text = gate.finish(is_tool_call).await;

            match response {
                LLMResponse::ToolCall(call) => {
                    info!(round, tool = %call.name, "Chat tool call");
                    let result = self.tools.dispatch(&call.name, &call.arguments);

                    self.memory.add_message(Message::assistant(full_text));
                    self.memory.add_message(Message::user(format!(
                        "TOOL_RESULT {}: {}",
                        call.name, result
                    )));
                    tool_calls.push(ToolInvocation {
                        name: call.name,
                        arguments: call.arguments,
                        result,
                    });
                }
                LLMResponse::FinalAnswer(answer) => {
                    self.memory.add_message(Message::assistant(answer.content.clone()));
                    info!(rounds = round, tools = tool_calls.len(), "Chat turn finished");
                    return Ok(ChatReply {
                        answer: answer.content,
                        rounds: round,
                        tool_calls,
                    });
                }
            }
        }

        warn!(max_rounds = self.max_rounds, "Chat turn ran out of rounds");
        Err(PipelineError::Timeout {
            stage: Stage::Chat,
            limit: Budget::Rounds(self.max_rounds),
        })
    }
}

fn chat_error(e: LLMError) -> PipelineError {
    PipelineError::Provider {
        stage: Stage::Chat,
        message: e.to_string(),
    }
}
