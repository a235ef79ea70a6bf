//! Chat assistant against a streaming provider
//!
//! Replies arrive in small chunks so that tool-call JSON is split across
//! chunk boundaries, the way real streaming backends deliver it.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use sdk::errors::{Budget, PipelineError, Stage};
use sdk::types::{Outline, OutlineMeta, OutlineSlide, Patch, SlideType};
use slidewright_engine::assistant::{ChatAssistant, DeckDocument, DeckTools};
use slidewright_engine::llm::{LLMError, LLMProvider, Message, Result, TextStream};
use slidewright_engine::pipeline::{parse_deck, validate_coverage};

const DECK: &str = "---\ntheme: default\ntitle: Q3\n---\n\n\
<!-- slide_id: cover -->\n# Q3 Review\n\n---\n\n\
<!-- slide_id: s01 -->\n# Growth\n\n- Revenue grew 12%\n";

struct ChunkedProvider {
    replies: Mutex<VecDeque<String>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ChunkedProvider {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LLMProvider for ChunkedProvider {
    fn name(&self) -> &str {
        "chunked"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::ProviderUnavailable("script exhausted".to_string()))
    }

    async fn generate_stream(&self, messages: &[Message]) -> Result<TextStream> {
        let reply = self.complete(messages).await?;
        let chars: Vec<char> = reply.chars().collect();
        let chunks: Vec<Result<String>> = chars
            .chunks(3)
            .map(|c| Ok(c.iter().collect::<String>()))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}

async fn drain(mut rx: mpsc::Receiver<String>) -> String {
    let mut out = String::new();
    while let Some(piece) = rx.recv().await {
        out.push_str(&piece);
    }
    out
}

#[tokio::test]
async fn test_edit_then_answer_streams_only_prose() {
    let provider = ChunkedProvider::new(&[
        r#"{"function": "update_page", "arguments": {"page_index": 1, "markdown": "<!-- slide_id: s01 -->\n# Growth\n\n- Revenue grew 12% in Q3"}}"#,
        r#"{"function": "apply_theme", "arguments": {"themeName": "seriph"}}"#,
        "Updated the growth slide and switched to seriph.",
    ]);
    let mut chat = ChatAssistant::new(provider.clone(), DeckDocument::parse(DECK), 5);

    let (tx, rx) = mpsc::channel(256);
    let reply = chat.send("Mention Q3 and use seriph", Some(tx)).await.unwrap();
    let streamed = drain(rx).await;

    assert_eq!(streamed, "Updated the growth slide and switched to seriph.");
    assert!(!streamed.contains("function"));
    assert_eq!(reply.rounds, 3);
    assert_eq!(reply.tool_calls.len(), 2);

    let rendered = chat.document().render();
    assert!(rendered.starts_with("---\ntheme: seriph\ntitle: Q3\n---"));
    let slides = parse_deck(&rendered);
    assert!(slides.iter().any(|s| s.body().contains("Revenue grew 12% in Q3")));

    // Every round sees the deck as it stands after the previous edit
    let seen = provider.seen.lock().unwrap();
    assert!(seen[1][0].content.contains("Revenue grew 12% in Q3"));
    assert!(seen[2].iter().any(|m| m.content.starts_with("TOOL_RESULT apply_theme")));
}

#[tokio::test]
async fn test_tool_error_is_reported_to_model() {
    let provider = ChunkedProvider::new(&[
        r##"{"function": "update_page", "arguments": {"page_index": 7, "markdown": "# Nope"}}"##,
        "That page does not exist.",
    ]);
    let mut chat = ChatAssistant::new(provider.clone(), DeckDocument::parse(DECK), 5);

    let reply = chat.send("edit page 7", None).await.unwrap();
    assert!(reply.tool_calls[0].result.starts_with("ERROR:"));
    assert_eq!(chat.document(), &DeckDocument::parse(DECK));
}

#[tokio::test]
async fn test_round_limit_is_a_rounds_timeout() {
    let call = r#"<tool_call>apply_theme({"theme_name": "bricks"})</tool_call>"#;
    let provider = ChunkedProvider::new(&[call, call, call]);
    let mut chat = ChatAssistant::new(provider, DeckDocument::parse(DECK), 3);

    let (tx, rx) = mpsc::channel(256);
    let err = chat.send("keep going", Some(tx)).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Timeout { stage: Stage::Chat, limit: Budget::Rounds(3) }
    ));
    assert!(drain(rx).await.is_empty());
}

#[tokio::test]
async fn test_history_carries_across_turns() {
    let provider = ChunkedProvider::new(&["First answer.", "Second answer."]);
    let mut chat = ChatAssistant::new(provider.clone(), DeckDocument::parse(DECK), 2);

    chat.send("one", None).await.unwrap();
    chat.send("two", None).await.unwrap();

    let seen = provider.seen.lock().unwrap();
    let second: Vec<&str> = seen[1][1..].iter().map(|m| m.content.as_str()).collect();
    assert_eq!(second, vec!["one", "First answer.", "two"]);
}

#[test]
fn test_patch_page_index_matches_chat_page_index() {
    let mut tools = DeckTools::new(DeckDocument::parse("<!-- slide_id: s01 -->\n# A\n\n- alpha"));
    assert_eq!(tools.dispatch("apply_theme", r#"{"theme_name": "seriph"}"#), "Theme set to seriph.");
    let saved = tools.document().render();

    let outline = Outline {
        outline_version: "v1".to_string(),
        meta: OutlineMeta::default(),
        slides: vec![OutlineSlide {
            slide_id: "s01".to_string(),
            slide_type: SlideType::Content,
            title: "A".to_string(),
            purpose: String::new(),
            density: String::new(),
            visual_hint: String::new(),
            bullets: vec!["alpha".to_string(), "beta".to_string()],
            must_include: vec!["alpha".to_string(), "beta".to_string()],
            source_card_ids: vec![],
        }],
    };
    let report = validate_coverage(&outline, &saved);
    assert_eq!(report.summary.total_deck_slides, tools.document().pages().len());

    let page_index = match &report.proposed_patches[0] {
        Patch::AppendBullets { page_index, .. } => *page_index,
        other => panic!("unexpected {:?}", other),
    };
    let args = serde_json::json!({
        "page_index": page_index,
        "markdown": "<!-- slide_id: s01 -->\n# A\n\n- alpha\n- beta",
    });
    let out = tools.dispatch("update_page", &args.to_string());
    assert_eq!(out, format!("Page {} updated.", page_index));
    assert!(validate_coverage(&outline, &tools.document().render()).is_complete());
}
