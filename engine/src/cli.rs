//! CLI interface for Slidewright
//!
//! Defines all commands and global flags using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Slidewright: evidence-constrained slide decks
///
/// Turns a source document into a Slidev deck in which every point traces
/// back to a verbatim quote, then checks the deck against its outline.
#[derive(Parser, Debug)]
#[command(name = "slidewright")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline on a source document
    Run {
        /// Source text file
        source: PathBuf,

        /// Style id (defaults to the configured style)
        #[arg(long)]
        style: Option<String>,

        /// Slidev theme (defaults to the configured theme)
        #[arg(long)]
        theme: Option<String>,

        /// Directory to write cards.json, outline.json, slides.md and coverage.json
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Extract evidence cards from a source document
    Extract {
        /// Source text file
        source: PathBuf,
    },

    /// Estimate the slide count for a number of cards
    Estimate {
        /// Number of evidence cards
        count: usize,
    },

    /// Build an outline from a cards JSON file
    Outline {
        /// JSON array of cards, as printed by `extract --json`
        cards: PathBuf,

        #[arg(long)]
        style: Option<String>,
    },

    /// Build deck markdown from an outline JSON file
    Deck {
        /// Outline JSON file
        outline: PathBuf,

        #[arg(long)]
        style: Option<String>,

        #[arg(long)]
        theme: Option<String>,
    },

    /// Check a deck against its outline and propose patches
    Validate {
        /// Outline JSON file
        outline: PathBuf,

        /// Deck markdown file
        deck: PathBuf,
    },

    /// Chat with the assistant about a deck, reading turns from stdin
    Chat {
        /// Deck markdown file
        deck: PathBuf,

        /// Write the edited deck back when the session ends
        #[arg(long)]
        save: bool,
    },

    /// List available styles
    Styles,

    /// List known themes and their layouts
    Themes,

    /// Check configuration, keys and provider reachability
    Doctor,

    /// Manage provider API keys in the OS keychain
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SecretAction {
    /// Store a key, read from stdin
    Set {
        /// Key name, e.g. openai_api_key
        key: String,
    },

    /// Remove a stored key
    Delete { key: String },
}
