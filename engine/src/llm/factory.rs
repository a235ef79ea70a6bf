use std::sync::Arc;

use sdk::errors::PipelineError;

use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::ollama::OllamaProvider;
use super::openai::OpenAIProvider;
use super::LLMProvider;
use crate::config::LLMConfig;
use crate::secrets::SecretCache;

/// Names accepted in `[llm] provider`
pub const SUPPORTED_PROVIDERS: &[&str] =
    &["ollama", "openai", "openai_compatible", "anthropic", "gemini"];

/// Build the adapter selected by `config.provider`
///
/// Names are matched case-insensitively and `-` is accepted for `_`.
/// An unknown name is fatal and is reported as `UnsupportedProvider`.
pub fn provider_from_config(
    config: &LLMConfig,
    secret_cache: Arc<SecretCache>,
) -> Result<Arc<dyn LLMProvider>, PipelineError> {
    let name = config.provider.trim().to_ascii_lowercase().replace('-', "_");

    let provider: Arc<dyn LLMProvider> = match name.as_str() {
        "ollama" => Arc::new(OllamaProvider::new(
            config.ollama.base_url.clone(),
            config.ollama.model.clone(),
        )),
        "openai" => Arc::new(OpenAIProvider::new(&config.openai, secret_cache)),
        "openai_compatible" => {
            if config.openai_compatible.model.trim().is_empty() {
                return Err(PipelineError::Config(
                    "[llm.openai_compatible] model must be set".to_string(),
                ));
            }
            Arc::new(OpenAIProvider::compatible(
                &config.openai_compatible,
                secret_cache,
            ))
        }
        "anthropic" => Arc::new(AnthropicProvider::new(
            config.anthropic.clone(),
            secret_cache,
        )),
        "gemini" => Arc::new(GeminiProvider::new(config.gemini.clone(), secret_cache)),
        _ => return Err(PipelineError::UnsupportedProvider(config.provider.clone())),
    };

    tracing::debug!("Using generation backend '{}'", provider.name());
    Ok(provider)
}
