//! Pipeline data model
//!
//! Every artifact handed between pipeline stages, and out to the GUI shell,
//! is one of these plain structured types. Wire names are snake_case.

use serde::{Deserialize, Serialize};

/// Prefix given to deck slides that carry no anchor comment
pub const UNKNOWN_SLIDE_PREFIX: &str = "unknown-";

/// Importance of an evidence card
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    #[serde(alias = "med")]
    Medium,
    Low,
}

/// A verbatim evidence excerpt extracted from source text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceCard {
    pub card_id: String,

    /// Literal substring of the source text
    pub quote: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub importance: Importance,
}

/// Kind of slide in an outline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlideType {
    Cover,
    Agenda,
    Content,
    Summary,
    Qa,
}

/// Outline-level metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutlineMeta {
    #[serde(default)]
    pub topic: String,

    #[serde(default)]
    pub estimated_pages: usize,
}

/// The structured, evidence-linked slide plan
///
/// The outline is the single source of truth for what must exist in the deck.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outline {
    #[serde(default = "default_outline_version")]
    pub outline_version: String,

    #[serde(default)]
    pub meta: OutlineMeta,

    /// A missing list is treated as empty so coverage stays computable
    #[serde(default)]
    pub slides: Vec<OutlineSlide>,
}

fn default_outline_version() -> String {
    "v1".to_string()
}

/// One planned slide
///
/// `must_include` is the binding contract: every string in it must appear
/// byte-for-byte in the generated slide body. `bullets` is advisory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "OutlineSlideWire")]
pub struct OutlineSlide {
    pub slide_id: String,

    #[serde(rename = "type")]
    pub slide_type: SlideType,

    pub title: String,
    pub purpose: String,
    pub density: String,
    pub visual_hint: String,
    pub bullets: Vec<String>,
    pub must_include: Vec<String>,
    pub source_card_ids: Vec<String>,
}

/// Deserialization shape for `OutlineSlide`
///
/// Kept separate so an omitted `must_include` can default to `bullets`
/// while an explicit empty list stays empty.
#[derive(Deserialize)]
struct OutlineSlideWire {
    slide_id: String,
    #[serde(rename = "type")]
    slide_type: SlideType,
    #[serde(default)]
    title: String,
    #[serde(default)]
    purpose: String,
    #[serde(default)]
    density: String,
    #[serde(default)]
    visual_hint: String,
    #[serde(default)]
    bullets: Vec<String>,
    must_include: Option<Vec<String>>,
    #[serde(default)]
    source_card_ids: Vec<String>,
}

impl From<OutlineSlideWire> for OutlineSlide {
    fn from(wire: OutlineSlideWire) -> Self {
        let must_include = wire.must_include.unwrap_or_else(|| wire.bullets.clone());
        Self {
            slide_id: wire.slide_id,
            slide_type: wire.slide_type,
            title: wire.title,
            purpose: wire.purpose,
            density: wire.density,
            visual_hint: wire.visual_hint,
            bullets: wire.bullets,
            must_include,
            source_card_ids: wire.source_card_ids,
        }
    }
}

/// A slide as found in generated deck markdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckSlide {
    /// Anchor id, or `unknown-<index>` when no anchor was found
    pub slide_id: String,

    /// Trimmed fragment text, anchor comment included
    pub content: String,

    /// Position among the non-empty fragments of the deck
    pub index: usize,

    /// Whether `slide_id` was read from a real anchor
    pub anchored: bool,
}

impl DeckSlide {
    /// Slide content with the leading anchor comment removed
    pub fn body(&self) -> &str {
        if !self.anchored {
            return &self.content;
        }
        match self.content.find("-->") {
            Some(end) => self.content[end + 3..].trim_start(),
            None => &self.content,
        }
    }
}

/// Coverage counters, always recomputed from the collected entries
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoverageSummary {
    pub total_outline_slides: usize,
    pub total_deck_slides: usize,
    pub missing_slide_count: usize,
    pub missing_point_count: usize,
}

/// An outline slide with no matching anchored deck slide
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingSlide {
    pub slide_id: String,

    /// Position of the slide in the outline
    pub expected_index: usize,

    pub title: String,
    pub must_include: Vec<String>,
    pub reason: String,
}

/// A deck slide that omits some of its `must_include` strings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingPoint {
    pub slide_id: String,

    /// Position of the slide in the deck
    pub page_index: usize,

    pub matched_points: Vec<String>,
    pub missing_points: Vec<String>,

    /// Short prefix of the slide body, for evidence
    pub excerpt: String,
}

/// Confidence attached to a proposed patch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A machine-proposed, not-yet-applied correction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Patch {
    /// Insert a reconstructed slide at an outline position
    InsertSlide {
        patch_id: String,
        slide_id: String,
        insert_at_index: usize,
        markdown: String,
        confidence: Confidence,
        explain: String,
    },

    /// Append missing bullets at the end of an existing slide
    AppendBullets {
        patch_id: String,
        slide_id: String,
        page_index: usize,
        append: Vec<String>,
        confidence: Confidence,
        explain: String,
    },
}

impl Patch {
    pub fn patch_id(&self) -> &str {
        match self {
            Patch::InsertSlide { patch_id, .. } | Patch::AppendBullets { patch_id, .. } => patch_id,
        }
    }

    pub fn slide_id(&self) -> &str {
        match self {
            Patch::InsertSlide { slide_id, .. } | Patch::AppendBullets { slide_id, .. } => slide_id,
        }
    }
}

/// Result of diffing a deck against its outline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoverageReport {
    pub outline_version: String,
    pub summary: CoverageSummary,
    pub missing_slides: Vec<MissingSlide>,
    pub missing_points: Vec<MissingPoint>,
    pub proposed_patches: Vec<Patch>,
    pub notes: Vec<String>,

    /// Anchor ids that occur more than once in the deck; first occurrence wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_slide_ids: Vec<String>,
}

impl CoverageReport {
    /// True when every outline slide and point was found
    pub fn is_complete(&self) -> bool {
        self.missing_slides.is_empty() && self.missing_points.is_empty()
    }
}
