use tokio::sync::mpsc;

/// Openings that mark structured output rather than prose
const HOLD_MARKERS: &[&str] = &["{\"function\"", "<tool_call>", "```"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    /// Only whitespace seen so far
    Undecided,
    Forwarding,
    Holding,
}

/// Forwards streamed prose to a sink while holding back tool-call text
///
/// A reply whose first non-blank character is `{`, `<`, or a backtick is
/// held. Prose is forwarded until a tool-call opening shows up, and never
/// past it. Held text is released by `finish` only when the reply turned
/// out not to be a tool call.
pub struct StreamGate {
    sink: Option<mpsc::Sender<String>>,
    state: GateState,
    buffer: String,
    sent: usize,
}

impl StreamGate {
    pub fn new(sink: Option<mpsc::Sender<String>>) -> Self {
        Self {
            sink,
            state: GateState::Undecided,
            buffer: String::new(),
            sent: 0,
        }
    }

    /// Everything received so far
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub async fn push(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);

        if self.state == GateState::Undecided {
            match self.buffer.trim_start().chars().next() {
                None => return,
                Some('{' | '<' | '`') => self.state = GateState::Holding,
                Some(_) => self.state = GateState::Forwarding,
            }
        }
        if self.state != GateState::Forwarding {
            return;
        }

        let unsent = &self.buffer[self.sent..];
        let end = match HOLD_MARKERS.iter().filter_map(|m| unsent.find(m)).min() {
            Some(at) => {
                self.state = GateState::Holding;
                self.sent + at
            }
            None => self.buffer.len() - partial_marker_len(unsent),
        };
        self.forward_to(end).await;
    }

    /// End of reply; releases held text unless it was a tool call
    pub async fn finish(&mut self, was_tool_call: bool) -> String {
        if !was_tool_call {
            self.forward_to(self.buffer.len()).await;
        }
        std::mem::take(&mut self.buffer)
    }

    async fn forward_to(&mut self, end: usize) {
        if end <= self.sent {
            return;
        }
        let piece = self.buffer[self.sent..end].to_string();
        self.sent = end;
        if let Some(sink) = &self.sink {
            if sink.send(piece).await.is_err() {
                tracing::debug!("Chat sink closed; dropping streamed text");
                self.sink = None;
            }
        }
    }
}

/// Length of the longest suffix of `text` that could start a hold marker
fn partial_marker_len(text: &str) -> usize {
    HOLD_MARKERS
        .iter()
        .flat_map(|m| (1..m.len()).rev().filter(move |&n| text.ends_with(&m[..n])))
        .max()
        .unwrap_or(0)
}
