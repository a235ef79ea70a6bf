use std::time::Duration;

use sdk::errors::{PipelineError, Stage};
use sdk::types::{Outline, SlideType, SourceCard};
use serde_json::json;

use super::capability::Generator;
use super::normalize::normalize_response;
use crate::styles::Style;

/// Cards to an evidence-linked outline
pub struct OutlineBuilder {
    generator: Generator,
    timeout: Duration,
}

impl OutlineBuilder {
    pub fn new(generator: Generator, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Ask for an outline and parse it strictly
    ///
    /// A reply that does not parse is returned as `MalformedResponse` with
    /// the raw text; structure is never repaired.
    pub async fn build(
        &self,
        cards: &[SourceCard],
        estimated_pages: usize,
        style: &Style,
    ) -> Result<Outline, PipelineError> {
        let prompt = json!({
            "estimated_pages": estimated_pages,
            "cards": cards,
        })
        .to_string();

        tracing::debug!(style = %style.id, cards = cards.len(), estimated_pages, "Building outline");

        let raw = self
            .generator
            .generate(&style.outline_prompt, &prompt, Stage::Outline, self.timeout)
            .await?;

        let outline = parse_outline(&raw, estimated_pages)?;
        tracing::info!(slides = outline.slides.len(), "Outline ready");
        Ok(outline)
    }
}

/// Parse a normalized outline reply and fill in missing metadata
pub fn parse_outline(raw: &str, estimated_pages: usize) -> Result<Outline, PipelineError> {
    let body = normalize_response(raw);
    let mut outline: Outline = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, raw = %raw, "Outline reply did not parse");
        PipelineError::MalformedResponse {
            stage: Stage::Outline,
            raw: raw.to_string(),
        }
    })?;

    if outline.meta.estimated_pages == 0 {
        outline.meta.estimated_pages = estimated_pages;
    }
    if outline.meta.topic.trim().is_empty() {
        if let Some(cover) = outline
            .slides
            .iter()
            .find(|s| s.slide_type == SlideType::Cover)
        {
            outline.meta.topic = cover.title.clone();
        }
    }

    Ok(outline)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTLINE: &str = r#"```json
{
  "outline_version": "v1",
  "slides": [
    {"slide_id": "cover", "type": "cover", "title": "Q3 Review", "bullets": []},
    {"slide_id": "s01", "type": "content", "title": "Growth",
     "bullets": ["Revenue grew 12%"], "source_card_ids": ["c001"]}
  ]
}
```"#;

    #[test]
    fn test_fenced_outline_parses_and_meta_is_filled() {
        let outline = parse_outline(OUTLINE, 8).unwrap();
        assert_eq!(outline.slides.len(), 2);
        assert_eq!(outline.meta.estimated_pages, 8);
        assert_eq!(outline.meta.topic, "Q3 Review");
        assert_eq!(outline.slides[1].must_include, vec!["Revenue grew 12%"]);
    }

    #[test]
    fn test_fence_and_tag_line_do_not_change_the_result() {
        let bare = OUTLINE
            .trim_start_matches("```json\n")
            .trim_end_matches("```")
            .trim();
        let tagged = format!("json\n{}", bare);

        let expected = parse_outline(bare, 8).unwrap();
        assert_eq!(parse_outline(OUTLINE, 8).unwrap(), expected);
        assert_eq!(parse_outline(&tagged, 8).unwrap(), expected);
    }

    #[test]
    fn test_reply_meta_is_kept() {
        let raw = r#"{"meta": {"topic": "Given", "estimated_pages": 9}, "slides": []}"#;
        let outline = parse_outline(raw, 6).unwrap();
        assert_eq!(outline.meta.topic, "Given");
        assert_eq!(outline.meta.estimated_pages, 9);
    }

    #[test]
    fn test_prose_reply_is_malformed_with_raw_text() {
        let raw = "Sorry, I cannot help with that.";
        match parse_outline(raw, 6) {
            Err(PipelineError::MalformedResponse { stage, raw: kept }) => {
                assert_eq!(stage, Stage::Outline);
                assert_eq!(kept, raw);
            }
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_json_is_not_repaired() {
        let raw = r#"{"slides": [{"slide_id": "s01", "type": "content""#;
        assert!(parse_outline(raw, 6).is_err());
    }
}
