//! Configuration management
//!
//! This module handles loading, validation, and management of the Slidewright
//! configuration. Configuration is stored in TOML format at ~/.slidewright/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **llm**: Which generation backend to use, plus per-provider endpoint and model
//! - **pipeline**: Default style and theme, per-stage timeouts, chat round limit
//! - **styles**: Custom instruction sets, keyed by style id (optional)
//!
//! API keys are never stored here; see [`crate::secrets`].
//!
//! # Examples
//!
//! ```no_run
//! use slidewright_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Provider: {}", config.llm.provider);
//! println!("Default style: {}", config.pipeline.style);
//! # Ok(())
//! # }
//! ```

use sdk::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Generation backend configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Custom styles, keyed by style id
    #[serde(default)]
    pub styles: BTreeMap<String, StyleConfig>,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Backend name (ollama, openai, openai_compatible, anthropic, gemini)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Any server speaking the OpenAI chat completions protocol
    #[serde(default)]
    pub openai_compatible: OpenAICompatibleConfig,

    /// Anthropic provider settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Gemini provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,
    // Note: API key stored in OS keychain, not in config
}

/// OpenAI-compatible server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAICompatibleConfig {
    /// Base URL of the server, including the version prefix
    #[serde(default = "default_openai_compatible_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default)]
    pub model: String,
    // Note: API key (if any) stored in OS keychain, not in config
}

/// Anthropic provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL for Anthropic API
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,
    // Note: API key stored in OS keychain, not in config
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,
    // Note: API key stored in OS keychain, not in config
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Style id used when none is given on the command line
    #[serde(default = "default_style")]
    pub style: String,

    /// Theme name used when none is given on the command line
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Bound on the extraction call (seconds)
    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,

    /// Bound on the outline call (seconds)
    #[serde(default = "default_outline_timeout")]
    pub outline_timeout_secs: u64,

    /// Bound on the deck call (seconds)
    #[serde(default = "default_deck_timeout")]
    pub deck_timeout_secs: u64,

    /// Maximum sequential generation rounds per chat turn
    #[serde(default = "default_chat_max_rounds")]
    pub chat_max_rounds: usize,
}

impl PipelineConfig {
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn outline_timeout(&self) -> Duration {
        Duration::from_secs(self.outline_timeout_secs)
    }

    pub fn deck_timeout(&self) -> Duration {
        Duration::from_secs(self.deck_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            style: default_style(),
            theme: default_theme(),
            extract_timeout_secs: default_extract_timeout(),
            outline_timeout_secs: default_outline_timeout(),
            deck_timeout_secs: default_deck_timeout(),
            chat_max_rounds: default_chat_max_rounds(),
        }
    }
}

/// A custom style: the pair of instruction texts fed to the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Display name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// System instructions for the outline stage
    pub outline_prompt: String,

    /// System instructions for the deck stage
    pub slide_prompt: String,
}

// Default value functions
fn default_provider() -> String {
    "ollama".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_compatible_base_url() -> String {
    "http://localhost:8000/v1".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_style() -> String {
    "business".to_string()
}

fn default_theme() -> String {
    "seriph".to_string()
}

fn default_extract_timeout() -> u64 {
    180
}

fn default_outline_timeout() -> u64 {
    180
}

fn default_deck_timeout() -> u64 {
    300
}

fn default_chat_max_rounds() -> usize {
    5
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

impl Default for OpenAICompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_compatible_base_url(),
            model: String::new(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            model: default_anthropic_model(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            ollama: OllamaConfig::default(),
            openai: OpenAIConfig::default(),
            openai_compatible: OpenAICompatibleConfig::default(),
            anthropic: AnthropicConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.slidewright/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, PipelineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, PipelineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, PipelineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();
        config.validate()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| PipelineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.slidewright/config.toml)
    pub fn default_config_path() -> Result<PathBuf, PipelineError> {
        let home = dirs::home_dir().ok_or_else(|| {
            PipelineError::Config("Could not determine home directory".to_string())
        })?;

        Ok(home.join(".slidewright").join("config.toml"))
    }

    /// Validate configuration values
    ///
    /// The provider name is not checked here: an unknown backend surfaces as
    /// `UnsupportedProvider` when the adapter is built.
    fn validate(&self) -> Result<(), PipelineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(PipelineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let timeouts = [
            ("extract_timeout_secs", self.pipeline.extract_timeout_secs),
            ("outline_timeout_secs", self.pipeline.outline_timeout_secs),
            ("deck_timeout_secs", self.pipeline.deck_timeout_secs),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(PipelineError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.pipeline.chat_max_rounds == 0 {
            return Err(PipelineError::Config(
                "chat_max_rounds must be at least 1".to_string(),
            ));
        }

        for (id, style) in &self.styles {
            if style.outline_prompt.trim().is_empty() || style.slide_prompt.trim().is_empty() {
                return Err(PipelineError::Config(format!(
                    "Style '{}' must define both outline_prompt and slide_prompt",
                    id
                )));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LLMConfig::default(),
            pipeline: PipelineConfig::default(),
            styles: BTreeMap::new(),
        }
    }
}
