//! Property-based tests for the pure pipeline stages

use proptest::prelude::*;

use sdk::types::{Outline, OutlineMeta, OutlineSlide, SlideType};
use slidewright_engine::pipeline::patch::reconstruct_slide;
use slidewright_engine::pipeline::{estimate_page_count, parse_deck, validate_coverage};

fn point() -> impl Strategy<Value = String> {
    "[A-Za-z0-9%$ ]{1,24}"
        .prop_map(|s| s.trim().to_string())
        .prop_filter("non-empty", |s| !s.is_empty())
}

fn outline_strategy() -> impl Strategy<Value = Outline> {
    prop::collection::vec(prop::collection::vec(point(), 0..4), 0..8).prop_map(|slides| Outline {
        outline_version: "v1".to_string(),
        meta: OutlineMeta::default(),
        slides: slides
            .into_iter()
            .enumerate()
            .map(|(i, points)| OutlineSlide {
                slide_id: format!("s{:02}", i),
                slide_type: SlideType::Content,
                title: format!("Slide {}", i),
                purpose: String::new(),
                density: String::new(),
                visual_hint: String::new(),
                bullets: points.clone(),
                must_include: points,
                source_card_ids: vec![],
            })
            .collect(),
    })
}

/// Render an outline the way a perfectly obedient generator would
fn faithful_deck(outline: &Outline) -> String {
    outline
        .slides
        .iter()
        .map(|s| reconstruct_slide(&s.slide_id, &s.title, &s.must_include))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

proptest! {
    #[test]
    fn prop_estimate_is_clamped_and_monotonic(count in 0usize..10_000) {
        let pages = estimate_page_count(count);
        prop_assert!((6..=18).contains(&pages));
        prop_assert!(estimate_page_count(count + 1) >= pages);
    }

    #[test]
    fn prop_faithful_deck_is_complete(outline in outline_strategy()) {
        let report = validate_coverage(&outline, &faithful_deck(&outline));
        prop_assert!(report.is_complete());
        prop_assert!(report.proposed_patches.is_empty());
        prop_assert_eq!(report.summary.total_deck_slides, outline.slides.len());
    }

    #[test]
    fn prop_validation_is_idempotent(outline in outline_strategy(), drop in 0usize..8) {
        let mut deck_outline = outline.clone();
        if drop < deck_outline.slides.len() {
            deck_outline.slides.remove(drop);
        }
        let deck = faithful_deck(&deck_outline);

        let first = validate_coverage(&outline, &deck);
        let second = validate_coverage(&outline, &deck);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_every_gap_gets_one_patch(outline in outline_strategy(), drop in 0usize..8) {
        let mut deck_outline = outline.clone();
        if drop < deck_outline.slides.len() {
            deck_outline.slides.remove(drop);
        }
        let report = validate_coverage(&outline, &faithful_deck(&deck_outline));
        prop_assert_eq!(
            report.proposed_patches.len(),
            report.missing_slides.len() + report.missing_points.len()
        );
    }

    #[test]
    fn prop_parser_never_yields_empty_slides(text in "(\\PC{0,20}\n(---\n)?){0,10}") {
        for slide in parse_deck(&text) {
            prop_assert!(!slide.content.trim().is_empty());
        }
    }
}
