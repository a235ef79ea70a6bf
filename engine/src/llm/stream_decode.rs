//! Line-oriented decoding of streamed HTTP bodies
//!
//! Ollama streams newline-delimited JSON and OpenAI streams server-sent
//! events. Both are split into lines here and handed to a per-backend
//! decoder that turns each line into a [`LineEvent`].

use std::collections::VecDeque;

use futures::stream::{self, Stream, StreamExt};

use super::{LLMError, Result, TextStream};

/// What a single line of a streamed body means
#[derive(Debug)]
pub enum LineEvent {
    /// A text delta to forward
    Text(String),
    /// Keep-alive, comment, or metadata with no text
    Skip,
    /// End of the completion; later lines are ignored
    Done,
    /// The backend reported an error inside the stream
    Fail(LLMError),
}

/// Accumulates raw bytes and yields complete lines
///
/// Bytes are kept until a newline arrives so a multi-byte character split
/// across network chunks is decoded whole.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete line
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            lines.push(text.trim_end_matches('\r').to_string());
        }
        lines
    }

    /// The unterminated remainder, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string();
        Some(text)
    }
}

struct DecodeState<F> {
    inner: futures::stream::BoxStream<'static, std::result::Result<Vec<u8>, LLMError>>,
    buffer: LineBuffer,
    ready: VecDeque<Result<String>>,
    finished: bool,
    decode: F,
}

impl<F> DecodeState<F>
where
    F: FnMut(&str) -> LineEvent,
{
    fn handle(&mut self, line: &str) {
        if self.finished {
            return;
        }
        match (self.decode)(line) {
            LineEvent::Text(text) if !text.is_empty() => self.ready.push_back(Ok(text)),
            LineEvent::Text(_) | LineEvent::Skip => {}
            LineEvent::Done => self.finished = true,
            LineEvent::Fail(e) => {
                self.ready.push_back(Err(e));
                self.finished = true;
            }
        }
    }
}

/// Turn a byte stream into a stream of decoded text chunks
///
/// The output ends at the first `Done` or `Fail` event, or when the body ends.
pub fn decode_lines<S, B, F>(body: S, decode: F) -> TextStream
where
    S: Stream<Item = std::result::Result<B, LLMError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    F: FnMut(&str) -> LineEvent + Send + 'static,
{
    let state = DecodeState {
        inner: body.map(|chunk| chunk.map(|b| b.as_ref().to_vec())).boxed(),
        buffer: LineBuffer::new(),
        ready: VecDeque::new(),
        finished: false,
        decode,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    for line in state.buffer.push(&chunk) {
                        state.handle(&line);
                    }
                }
                Some(Err(e)) => {
                    state.ready.push_back(Err(e));
                    state.finished = true;
                }
                None => {
                    if let Some(line) = state.buffer.finish() {
                        state.handle(&line);
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
