//! Slidewright Engine Library
//!
//! Evidence-constrained slide deck generation: source text in, a Slidev deck
//! plus a coverage report out. Used by the binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Built-in and custom styles, theme catalog
pub mod styles;

/// Content pipeline stages
pub mod pipeline;

/// Interactive deck assistant
pub mod assistant;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
