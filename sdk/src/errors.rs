//! Error types and handling
//!
//! This module provides the error types used throughout the Slidewright pipeline.
//! All errors implement the `PipelineErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never carry API keys. `MalformedResponse` keeps the raw model
//! output for diagnosis, but its `Display` only reports the length; the raw text
//! is logged separately at the call site.

use std::fmt;
use thiserror::Error;

/// Trait for pipeline error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information.
pub trait PipelineErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller. The pipeline itself
    /// never retries.
    fn is_recoverable(&self) -> bool;
}

/// Pipeline stage that issued a remote generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Outline,
    Deck,
    Chat,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extraction => write!(f, "extraction"),
            Stage::Outline => write!(f, "outline generation"),
            Stage::Deck => write!(f, "deck generation"),
            Stage::Chat => write!(f, "chat turn"),
        }
    }
}

/// The bound a remote call ran out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Wall-clock bound in seconds
    Seconds(u64),
    /// Maximum number of sequential tool-invocation rounds
    Rounds(usize),
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Seconds(secs) => write!(f, "{}s", secs),
            Budget::Rounds(rounds) => write!(f, "{} tool rounds", rounds),
        }
    }
}

/// Main pipeline error type
///
/// # Error Categories
///
/// - **Timeout**: a remote call exceeded its time or round budget
/// - **MalformedResponse**: the model answered, but not in the expected shape
/// - **Provider**: network or model failure before any usable text came back
/// - **UnsupportedProvider**: configuration names a backend with no adapter
/// - **QuoteIntegrity**: an extracted card quotes text absent from the source
///
/// # Examples
///
/// ```
/// use sdk::errors::{Budget, PipelineError, PipelineErrorExt, Stage};
///
/// let error = PipelineError::Timeout { stage: Stage::Outline, limit: Budget::Seconds(180) };
/// assert!(error.user_hint().contains("connectivity"));
/// assert!(error.is_recoverable());
///
/// let fatal = PipelineError::UnsupportedProvider("mistral".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} timed out after {limit}")]
    Timeout { stage: Stage, limit: Budget },

    #[error("{stage} returned a malformed response ({} bytes)", raw.len())]
    MalformedResponse { stage: Stage, raw: String },

    #[error("{stage} failed: {message}")]
    Provider { stage: Stage, message: String },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Quote of card {card_id} is not present verbatim in the source")]
    QuoteIntegrity { card_id: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stage the error was raised in, when it came from a remote call
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Timeout { stage, .. }
            | Self::MalformedResponse { stage, .. }
            | Self::Provider { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Raw model output, when the error carries one
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl PipelineErrorExt for PipelineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Timeout { .. } => {
                "The model took too long. Check network connectivity and provider configuration"
            }
            Self::MalformedResponse { .. } => {
                "The model answered in an unexpected format. Please retry"
            }
            Self::Provider { .. } => "Provider call failed. Check your API keys and network",
            Self::UnsupportedProvider(_) => {
                "Configured provider is not supported. Check [llm] provider in config.toml"
            }
            Self::QuoteIntegrity { .. } => "An extracted quote was discarded",
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Keyring(_) => "Failed to access secure storage. Check system keychain",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::UnsupportedProvider(_) | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_stage_and_budget() {
        let err = PipelineError::Timeout {
            stage: Stage::Extraction,
            limit: Budget::Seconds(180),
        };
        assert_eq!(err.to_string(), "extraction timed out after 180s");

        let err = PipelineError::Timeout {
            stage: Stage::Chat,
            limit: Budget::Rounds(5),
        };
        assert_eq!(err.to_string(), "chat turn timed out after 5 tool rounds");
    }

    #[test]
    fn test_malformed_response_keeps_raw_but_hides_it_in_display() {
        let err = PipelineError::MalformedResponse {
            stage: Stage::Outline,
            raw: "not json at all".to_string(),
        };
        assert_eq!(err.raw_response(), Some("not json at all"));
        assert!(!err.to_string().contains("not json"));
        assert_eq!(err.stage(), Some(Stage::Outline));
    }

    #[test]
    fn test_recoverability() {
        assert!(!PipelineError::UnsupportedProvider("x".into()).is_recoverable());
        assert!(!PipelineError::Config("bad".into()).is_recoverable());
        assert!(PipelineError::Provider {
            stage: Stage::Deck,
            message: "503".into()
        }
        .is_recoverable());
    }
}
