//! Coverage validation
//!
//! Diffs a generated deck against its outline without calling the model.
//! The outline says what must exist, the deck says what does. Every gap
//! becomes a finding plus a mechanical patch proposal.

use std::collections::HashMap;

use sdk::types::{
    CoverageReport, CoverageSummary, DeckSlide, MissingPoint, MissingSlide, Outline,
};

use super::parser::parse_deck;
use super::patch::PatchProposer;

/// Longest slide body excerpt kept as evidence, in characters
pub const EXCERPT_CHARS: usize = 160;

const COMPLETE_NOTE: &str = "All outline slides and must_include points are present in the deck.";

/// Compare a deck against its outline
///
/// Pure and idempotent. Lookup is by exact anchor id; unanchored slides
/// never satisfy an outline slide. Containment is a literal, case-sensitive
/// substring test against the slide body with its anchor removed.
pub fn validate_coverage(outline: &Outline, deck_markdown: &str) -> CoverageReport {
    let deck = parse_deck(deck_markdown);

    let mut by_id: HashMap<&str, &DeckSlide> = HashMap::with_capacity(deck.len());
    let mut duplicate_slide_ids: Vec<String> = Vec::new();
    for slide in deck.iter().filter(|s| s.anchored) {
        if by_id.contains_key(slide.slide_id.as_str()) {
            if !duplicate_slide_ids.contains(&slide.slide_id) {
                tracing::warn!(
                    slide_id = %slide.slide_id,
                    "Deck repeats a slide id; using the first occurrence"
                );
                duplicate_slide_ids.push(slide.slide_id.clone());
            }
            continue;
        }
        by_id.insert(slide.slide_id.as_str(), slide);
    }

    let mut missing_slides = Vec::new();
    let mut missing_points = Vec::new();
    let mut proposer = PatchProposer::new();

    for (expected_index, planned) in outline.slides.iter().enumerate() {
        let Some(slide) = by_id.get(planned.slide_id.as_str()) else {
            let missing = MissingSlide {
                slide_id: planned.slide_id.clone(),
                expected_index,
                title: planned.title.clone(),
                must_include: planned.must_include.clone(),
                reason: "No deck slide carries this slide_id anchor.".to_string(),
            };
            proposer.propose_insert(&missing);
            missing_slides.push(missing);
            continue;
        };

        let body = slide.body();
        let (matched_points, missing): (Vec<String>, Vec<String>) = planned
            .must_include
            .iter()
            .cloned()
            .partition(|point| body.contains(point.as_str()));

        if missing.is_empty() {
            continue;
        }

        let gap = MissingPoint {
            slide_id: planned.slide_id.clone(),
            page_index: slide.index,
            matched_points,
            missing_points: missing,
            excerpt: excerpt(body),
        };
        proposer.propose_append(&gap);
        missing_points.push(gap);
    }

    let summary = CoverageSummary {
        total_outline_slides: outline.slides.len(),
        total_deck_slides: deck.len(),
        missing_slide_count: missing_slides.len(),
        missing_point_count: missing_points.iter().map(|m| m.missing_points.len()).sum(),
    };

    let note = if missing_slides.is_empty() && missing_points.is_empty() {
        COMPLETE_NOTE.to_string()
    } else {
        format!(
            "{} of {} outline slides missing; {} must_include point(s) missing across {} slide(s).",
            summary.missing_slide_count,
            summary.total_outline_slides,
            summary.missing_point_count,
            missing_points.len()
        )
    };

    tracing::debug!(
        outline_slides = summary.total_outline_slides,
        deck_slides = summary.total_deck_slides,
        missing_slides = summary.missing_slide_count,
        missing_points = summary.missing_point_count,
        "Coverage validated"
    );

    CoverageReport {
        outline_version: outline.outline_version.clone(),
        summary,
        missing_slides,
        missing_points,
        proposed_patches: proposer.into_patches(),
        notes: vec![note],
        duplicate_slide_ids,
    }
}

fn excerpt(body: &str) -> String {
    let flat = body.trim();
    match flat.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => flat[..cut].to_string(),
        None => flat.to_string(),
    }
}
