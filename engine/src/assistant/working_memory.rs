//! Chat history bounded by an approximate token budget
//!
//! The system prompt is rebuilt every round from the live deck, so it is
//! never stored here. Only conversation turns are kept, oldest first.

use crate::llm::Message;

/// Default history budget in tokens
const DEFAULT_CONTEXT_LIMIT: usize = 8000;

/// Rough estimate: 1 token per 4 characters
const CHARS_PER_TOKEN: usize = 4;

/// Fixed overhead per message for role and framing
const MESSAGE_OVERHEAD: usize = 10;

/// Messages always kept regardless of budget
const MIN_KEPT: usize = 2;

#[derive(Debug, Clone)]
pub struct WorkingMemory {
    messages: Vec<Message>,
    context_limit: usize,
    token_count: usize,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_CONTEXT_LIMIT)
    }

    pub fn with_limit(context_limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            context_limit,
            token_count: 0,
        }
    }

    /// Add a message, trimming the oldest ones if over budget
    pub fn add_message(&mut self, message: Message) {
        self.token_count += estimate_tokens(&message);
        self.messages.push(message);

        if self.token_count > self.context_limit {
            self.trim();
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    fn trim(&mut self) {
        let mut dropped = 0;
        while self.token_count > self.context_limit && self.messages.len() > MIN_KEPT {
            let removed = self.messages.remove(0);
            self.token_count = self.token_count.saturating_sub(estimate_tokens(&removed));
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, tokens = self.token_count, "Trimmed chat history");
        }
    }
}

impl Default for WorkingMemory {
    fn default() -> Self {
        Self::new()
    }
}

fn estimate_tokens(message: &Message) -> usize {
    message.content.len().div_ceil(CHARS_PER_TOKEN) + MESSAGE_OVERHEAD
}
