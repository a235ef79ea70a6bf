use proptest::prelude::*;
use sdk::errors::{Budget, PipelineError, PipelineErrorExt, Stage};

// Error hints are static, non-empty, and never echo the wrapped detail
proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "[a-z0-9 ]{1,40}") {
        let errs = vec![
            PipelineError::Config(error_str.clone()),
            PipelineError::UnsupportedProvider(error_str.clone()),
            PipelineError::QuoteIntegrity { card_id: error_str.clone() },
            PipelineError::Provider { stage: Stage::Deck, message: error_str.clone() },
            PipelineError::MalformedResponse { stage: Stage::Outline, raw: error_str.clone() },
            PipelineError::Timeout { stage: Stage::Extraction, limit: Budget::Seconds(1) },
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            let quoted = format!("'{}'", error_str);
            prop_assert!(!hint.contains(&quoted));
        }
    }
}
