//! Slidewright SDK
//!
//! Shared data model and error types for the content pipeline.
//! This crate is used by the engine and by any shell that consumes
//! pipeline artifacts.

/// Error types and handling
pub mod errors;

/// Pipeline data model
pub mod types;

// Re-export commonly used types
pub use errors::{Budget, PipelineError, PipelineErrorExt, Stage};
pub use types::{
    Confidence, CoverageReport, CoverageSummary, DeckSlide, Importance, MissingPoint,
    MissingSlide, Outline, OutlineMeta, OutlineSlide, Patch, SlideType, SourceCard,
};
