use std::sync::Arc;
use std::time::{Duration, Instant};

use sdk::errors::{Budget, PipelineError, Stage};
use tokio::time::timeout;

use crate::llm::{LLMError, LLMProvider, Message};

/// Single-shot text generation bounded by a per-stage timeout
///
/// The call future is owned by `tokio::time::timeout`; when the timer fires
/// the future is dropped, which aborts the in-flight HTTP request. On
/// success the timer is dropped together with the wrapper.
#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn LLMProvider>,
}

impl Generator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Run one system + user exchange and return the raw reply
    pub async fn generate(
        &self,
        system: &str,
        prompt: &str,
        stage: Stage,
        limit: Duration,
    ) -> Result<String, PipelineError> {
        let messages = [Message::system(system), Message::user(prompt)];
        let started = Instant::now();

        tracing::debug!(
            stage = %stage,
            provider = self.provider.name(),
            prompt_chars = prompt.len(),
            "Calling generator"
        );

        match timeout(limit, self.provider.complete(&messages)).await {
            Ok(Ok(text)) => {
                tracing::info!(
                    stage = %stage,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    reply_chars = text.len(),
                    "Generator replied"
                );
                Ok(text)
            }
            Ok(Err(LLMError::Timeout)) | Err(_) => {
                tracing::warn!(stage = %stage, limit_secs = limit.as_secs(), "Generator timed out");
                Err(PipelineError::Timeout {
                    stage,
                    limit: Budget::Seconds(limit.as_secs()),
                })
            }
            Ok(Err(e)) => {
                tracing::error!(stage = %stage, "Generator failed: {}", e);
                Err(PipelineError::Provider {
                    stage,
                    message: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Slow;

    #[async_trait]
    impl LLMProvider for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn is_local(&self) -> bool {
            true
        }

        async fn complete(&self, _messages: &[Message]) -> crate::llm::Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("late".into())
        }
    }

    struct Failing;

    #[async_trait]
    impl LLMProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn is_local(&self) -> bool {
            true
        }

        async fn complete(&self, _messages: &[Message]) -> crate::llm::Result<String> {
            Err(LLMError::ProviderUnavailable("down".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_stage_timeout() {
        let generator = Generator::new(Arc::new(Slow));
        let err = generator
            .generate("s", "p", Stage::Outline, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Timeout {
                stage: Stage::Outline,
                limit: Budget::Seconds(2)
            }
        ));
    }

    #[tokio::test]
    async fn test_provider_error_keeps_stage() {
        let generator = Generator::new(Arc::new(Failing));
        let err = generator
            .generate("s", "p", Stage::Extraction, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Extraction));
        assert!(err.to_string().contains("down"));
    }
}
