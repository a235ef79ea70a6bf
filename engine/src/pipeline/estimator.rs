/// Cover, agenda, summary, and Q&A
const FIXED_SLIDES: usize = 4;
const CARDS_PER_SLIDE: f64 = 2.5;
pub const MIN_PAGES: usize = 6;
pub const MAX_PAGES: usize = 18;

/// Target slide count for a number of evidence cards
///
/// `4 + round(cards / 2.5)`, clamped to `[6, 18]`.
pub fn estimate_page_count(card_count: usize) -> usize {
    let content = (card_count as f64 / CARDS_PER_SLIDE).round() as usize;
    (FIXED_SLIDES + content).clamp(MIN_PAGES, MAX_PAGES)
}
