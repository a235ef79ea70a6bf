use std::time::Duration;

use sdk::errors::{PipelineError, Stage};
use sdk::types::Outline;
use serde_json::json;

use super::capability::Generator;
use super::normalize::normalize_response;
use crate::styles::{Style, ThemeCatalog};

/// Appended to every style's slide prompt, custom styles included
const DECK_CONSTRAINTS: &str = "\
Non-negotiable output contract:
1. Produce exactly one slide per OUTLINE_JSON slide, in the same order. Do not add or drop slides.
2. The first line of each slide is <!-- slide_id: ID --> with that slide's slide_id.
3. Every string in a slide's must_include appears in that slide verbatim: same characters, same case, same punctuation.
4. Separate slides with a line containing only ---. Never put a line containing only --- inside a slide.";

/// Outline to anchored deck markdown
pub struct DeckBuilder {
    generator: Generator,
    timeout: Duration,
}

impl DeckBuilder {
    pub fn new(generator: Generator, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Ask for the deck and return it with any wrapper fence removed
    ///
    /// The reply is not checked against the outline here; that is the
    /// coverage validator's job.
    pub async fn build(
        &self,
        outline: &Outline,
        theme: &str,
        style: &Style,
    ) -> Result<String, PipelineError> {
        let capabilities = ThemeCatalog::resolve(theme);
        let system = deck_system_prompt(style);
        let prompt = format!(
            "OUTLINE_JSON:\n{}\n\nTHEME_CAPABILITIES:\n{}",
            json!(outline),
            json!(capabilities)
        );

        tracing::debug!(
            style = %style.id,
            theme = capabilities.theme,
            slides = outline.slides.len(),
            "Building deck"
        );

        let raw = self
            .generator
            .generate(&system, &prompt, Stage::Deck, self.timeout)
            .await?;

        let markdown = normalize_response(&raw);
        if markdown.is_empty() {
            tracing::error!(raw = %raw, "Deck reply is empty");
            return Err(PipelineError::MalformedResponse {
                stage: Stage::Deck,
                raw,
            });
        }

        Ok(markdown.replace("\r\n", "\n"))
    }
}

fn deck_system_prompt(style: &Style) -> String {
    format!("{}\n\n{}", style.slide_prompt.trim_end(), DECK_CONSTRAINTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::StyleBook;

    #[test]
    fn test_constraints_follow_custom_prompt() {
        let mut style = StyleBook::builtin().resolve("tech").clone();
        style.slide_prompt = "Write playful slides.\n\n".to_string();

        let prompt = deck_system_prompt(&style);
        assert!(prompt.starts_with("Write playful slides."));
        assert!(prompt.ends_with(DECK_CONSTRAINTS));
        assert!(prompt.contains("<!-- slide_id: ID -->"));
    }
}
