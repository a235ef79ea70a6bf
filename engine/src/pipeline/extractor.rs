use std::collections::HashSet;
use std::time::Duration;

use sdk::errors::{PipelineError, Stage};
use sdk::types::{Importance, SourceCard};
use serde::{Deserialize, Serialize};

use super::capability::Generator;
use super::normalize::normalize_response;

const EXTRACT_SYSTEM_PROMPT: &str = r#"You extract evidence cards from a source document for a presentation.

Reply with a JSON array only:
[
  { "card_id": "c001", "quote": "...", "tags": ["..."], "importance": "high | medium | low" }
]

Rules:
- "quote" is copied character for character from the source. Do not fix typos, translate, or shorten inside a quote.
- One idea per card. Prefer facts, figures, definitions, and conclusions.
- Do not add anything that is not in the source.
- Number card_id sequentially: c001, c002, ..."#;

/// Cards that survived the integrity check, and the ids of those that did not
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Extraction {
    pub cards: Vec<SourceCard>,
    pub dropped: Vec<String>,
}

/// Source text to evidence cards
pub struct Extractor {
    generator: Generator,
    timeout: Duration,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCards {
    List(Vec<RawCard>),
    Wrapped { cards: Vec<RawCard> },
}

#[derive(Debug, Deserialize)]
struct RawCard {
    #[serde(default)]
    card_id: String,
    #[serde(default)]
    quote: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    importance: Option<String>,
}

impl Extractor {
    pub fn new(generator: Generator, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub async fn extract(&self, source: &str) -> Result<Extraction, PipelineError> {
        let prompt = format!("SOURCE_TEXT:\n<<<\n{}\n>>>", source);
        let raw = self
            .generator
            .generate(EXTRACT_SYSTEM_PROMPT, &prompt, Stage::Extraction, self.timeout)
            .await?;

        let cards = parse_cards(&raw)?;
        let extraction = verify_cards(source, cards);

        tracing::info!(
            kept = extraction.cards.len(),
            dropped = extraction.dropped.len(),
            "Extraction complete"
        );
        Ok(extraction)
    }
}

fn parse_cards(raw: &str) -> Result<Vec<RawCard>, PipelineError> {
    let body = normalize_response(raw);
    match serde_json::from_str::<RawCards>(body) {
        Ok(RawCards::List(cards)) | Ok(RawCards::Wrapped { cards }) => Ok(cards),
        Err(e) => {
            tracing::error!(error = %e, raw = %raw, "Extraction reply is not a card list");
            Err(PipelineError::MalformedResponse {
                stage: Stage::Extraction,
                raw: raw.to_string(),
            })
        }
    }
}

fn parse_importance(value: Option<&str>) -> Importance {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("high") => Importance::High,
        Some("low") => Importance::Low,
        _ => Importance::Medium,
    }
}

/// Drop cards whose quote is not in `source`, order the rest by position,
/// and make card ids unique
fn verify_cards(source: &str, raw_cards: Vec<RawCard>) -> Extraction {
    let mut dropped = Vec::new();
    let mut located: Vec<(usize, RawCard)> = Vec::with_capacity(raw_cards.len());

    for card in raw_cards {
        let offset = if card.quote.trim().is_empty() {
            None
        } else {
            source.find(&card.quote)
        };

        match offset {
            Some(offset) => located.push((offset, card)),
            None => {
                let err = PipelineError::QuoteIntegrity {
                    card_id: card.card_id.clone(),
                };
                tracing::warn!("Dropping card: {}", err);
                dropped.push(card.card_id);
            }
        }
    }

    // Stable: equal offsets keep reply order
    located.sort_by_key(|(offset, _)| *offset);

    let taken: HashSet<String> = located
        .iter()
        .map(|(_, c)| c.card_id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let mut assigned: HashSet<String> = HashSet::new();
    let mut next_id = 1usize;

    let cards = located
        .into_iter()
        .map(|(_, card)| {
            let id = card.card_id.trim().to_string();
            let card_id = if !id.is_empty() && !assigned.contains(&id) {
                id
            } else {
                loop {
                    let candidate = format!("c{:03}", next_id);
                    next_id += 1;
                    if !taken.contains(&candidate) && !assigned.contains(&candidate) {
                        break candidate;
                    }
                }
            };
            assigned.insert(card_id.clone());

            SourceCard {
                card_id,
                importance: parse_importance(card.importance.as_deref()),
                quote: card.quote,
                tags: card.tags,
            }
        })
        .collect();

    Extraction { cards, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, quote: &str) -> RawCard {
        RawCard {
            card_id: id.to_string(),
            quote: quote.to_string(),
            tags: vec![],
            importance: None,
        }
    }

    #[test]
    fn test_parse_bare_array_in_fence() {
        let reply = "```json\n[{\"card_id\": \"c001\", \"quote\": \"q\", \"importance\": \"high\"}]\n```";
        let cards = parse_cards(reply).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].card_id, "c001");
    }

    #[test]
    fn test_parse_wrapped_object() {
        let cards = parse_cards(r#"{"cards": [{"quote": "q"}]}"#).unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_cards("Here are your cards!").unwrap_err();
        assert_eq!(err.raw_response(), Some("Here are your cards!"));
        assert_eq!(err.stage(), Some(Stage::Extraction));
    }

    #[test]
    fn test_quote_absent_from_source_is_dropped() {
        let source = "Revenue grew 12% in 2023.";
        let extraction = verify_cards(
            source,
            vec![raw("c001", "Revenue grew 12%"), raw("c002", "Revenue grew 15%")],
        );
        assert_eq!(extraction.cards.len(), 1);
        assert_eq!(extraction.dropped, vec!["c002"]);
    }

    #[test]
    fn test_empty_quote_is_dropped() {
        let extraction = verify_cards("abc", vec![raw("c001", "  ")]);
        assert!(extraction.cards.is_empty());
        assert_eq!(extraction.dropped, vec!["c001"]);
    }

    #[test]
    fn test_quote_match_is_case_sensitive() {
        let extraction = verify_cards("Alpha beta", vec![raw("c001", "alpha")]);
        assert!(extraction.cards.is_empty());
    }

    #[test]
    fn test_cards_ordered_by_source_position() {
        let source = "first. second. third.";
        let extraction = verify_cards(
            source,
            vec![raw("c003", "third"), raw("c001", "first"), raw("c002", "second")],
        );
        let ids: Vec<&str> = extraction.cards.iter().map(|c| c.card_id.as_str()).collect();
        assert_eq!(ids, vec!["c001", "c002", "c003"]);
    }

    #[test]
    fn test_blank_and_duplicate_ids_are_renumbered() {
        let source = "one two three";
        let extraction = verify_cards(
            source,
            vec![raw("c001", "one"), raw("c001", "two"), raw("", "three")],
        );
        let ids: Vec<&str> = extraction.cards.iter().map(|c| c.card_id.as_str()).collect();
        assert_eq!(ids, vec!["c001", "c002", "c003"]);
    }

    #[test]
    fn test_unknown_importance_defaults_to_medium() {
        assert_eq!(parse_importance(Some("critical")), Importance::Medium);
        assert_eq!(parse_importance(Some("HIGH")), Importance::High);
        assert_eq!(parse_importance(None), Importance::Medium);
    }
}
