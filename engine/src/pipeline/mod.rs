//! Content pipeline
//!
//! Source text flows through the stages strictly in order:
//!
//! 1. [`Extractor`]: source text to verbatim evidence cards
//! 2. [`estimate_page_count`]: card count to a target slide count
//! 3. [`OutlineBuilder`]: cards to an evidence-linked outline
//! 4. [`DeckBuilder`]: outline to anchored deck markdown
//! 5. [`parse_deck`]: markdown to slides
//! 6. [`validate_coverage`]: outline against deck, with patch proposals
//!
//! Stages 1, 3, and 4 call the generator and are each bounded by their own
//! timeout. The rest are synchronous and hold no state. Nothing retries;
//! a failed stage is returned to the caller as is.

pub mod capability;
pub mod coverage;
pub mod deck;
pub mod estimator;
pub mod extractor;
pub mod normalize;
pub mod outline;
pub mod parser;
pub mod patch;

pub use capability::Generator;
pub use coverage::validate_coverage;
pub use deck::DeckBuilder;
pub use estimator::estimate_page_count;
pub use extractor::{Extraction, Extractor};
pub use normalize::normalize_response;
pub use outline::OutlineBuilder;
pub use parser::parse_deck;
pub use patch::PatchProposer;

use sdk::errors::PipelineError;
use sdk::types::{CoverageReport, Outline};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::styles::StyleBook;

/// Everything one end-to-end run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub extraction: Extraction,
    pub estimated_pages: usize,
    pub outline: Outline,
    pub deck_markdown: String,
    pub report: CoverageReport,
}

/// The assembled stages
pub struct Pipeline {
    extractor: Extractor,
    outline_builder: OutlineBuilder,
    deck_builder: DeckBuilder,
    styles: StyleBook,
}

impl Pipeline {
    pub fn new(generator: Generator, styles: StyleBook, config: &PipelineConfig) -> Self {
        Self {
            extractor: Extractor::new(generator.clone(), config.extract_timeout()),
            outline_builder: OutlineBuilder::new(generator.clone(), config.outline_timeout()),
            deck_builder: DeckBuilder::new(generator, config.deck_timeout()),
            styles,
        }
    }

    /// Run every stage in order
    pub async fn run(
        &self,
        source: &str,
        style_id: &str,
        theme: &str,
    ) -> Result<PipelineRun, PipelineError> {
        let style = self.styles.resolve(style_id);
        tracing::info!(style = %style.id, theme, source_chars = source.len(), "Pipeline run started");

        let extraction = self.extractor.extract(source).await?;

        let estimated_pages = estimate_page_count(extraction.cards.len());
        tracing::info!(cards = extraction.cards.len(), estimated_pages, "Page count estimated");

        let outline = self
            .outline_builder
            .build(&extraction.cards, estimated_pages, style)
            .await?;

        let deck_markdown = self.deck_builder.build(&outline, theme, style).await?;

        let report = validate_coverage(&outline, &deck_markdown);
        tracing::info!(
            complete = report.is_complete(),
            patches = report.proposed_patches.len(),
            "Pipeline run finished"
        );

        Ok(PipelineRun {
            extraction,
            estimated_pages,
            outline,
            deck_markdown,
            report,
        })
    }
}
