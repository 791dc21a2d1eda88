//! Generation service: send the assembled request to a chat model.
//!
//! The model is an external collaborator behind one trait,
//! [`GenerationService`]: a [`ComparisonRequest`] goes in, a [`Generation`]
//! comes out. [`ProviderService`] implements it over any `edgequake-llm`
//! provider: OpenAI with the key resolved by [`crate::credentials`], or a
//! named provider (Anthropic, Gemini, Ollama, ...) that reads its own key
//! from the environment.
//!
//! There is no retry. The whole call is bounded by
//! [`generate_with_timeout`]; running out of time is reported as
//! [`CompareError::ApiTimeout`], distinct from every other remote failure.

use super::request::ComparisonRequest;
use crate::error::CompareError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A model answer plus token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Request/response contract of the external generation service.
pub trait GenerationService: Send + Sync {
    /// Short provider name for messages ("openai", "anthropic", ...).
    fn provider_label(&self) -> &str;

    /// Perform one completion.
    fn generate(
        &self,
        request: &ComparisonRequest,
    ) -> impl Future<Output = Result<Generation, CompareError>> + Send;
}

/// Run `service.generate` with an upper bound on wall-clock time.
pub async fn generate_with_timeout<G: GenerationService>(
    service: &G,
    request: &ComparisonRequest,
    timeout: Duration,
) -> Result<Generation, CompareError> {
    let start = Instant::now();
    match tokio::time::timeout(timeout, service.generate(request)).await {
        Ok(result) => {
            debug!(
                "{} answered in {:?}",
                service.provider_label(),
                start.elapsed()
            );
            result.map_err(|e| match e {
                // The provider's own timer fired; report our elapsed time.
                CompareError::ApiTimeout { .. } => CompareError::ApiTimeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                },
                other => other,
            })
        }
        Err(_) => {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            warn!(
                "{} did not answer within {:?}",
                service.provider_label(),
                timeout
            );
            Err(CompareError::ApiTimeout { elapsed_ms })
        }
    }
}

/// Map a provider error onto the comparison error taxonomy.
pub fn map_llm_error(provider: &str, e: LlmError) -> CompareError {
    match e {
        LlmError::Timeout => CompareError::ApiTimeout { elapsed_ms: 0 },
        LlmError::AuthError(detail) => CompareError::AuthError {
            provider: provider.to_string(),
            detail,
        },
        LlmError::RateLimited(_) => CompareError::RateLimitExceeded {
            provider: provider.to_string(),
            retry_after_secs: None,
        },
        other => CompareError::LlmApiError {
            message: other.to_string(),
        },
    }
}

/// Adapter over an `edgequake-llm` provider.
pub struct ProviderService {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl std::fmt::Debug for ProviderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderService")
            .field("label", &self.label)
            .finish()
    }
}

impl ProviderService {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

impl GenerationService for ProviderService {
    fn provider_label(&self) -> &str {
        &self.label
    }

    async fn generate(&self, request: &ComparisonRequest) -> Result<Generation, CompareError> {
        let messages = vec![
            ChatMessage::system(request.system_prompt.as_str()),
            ChatMessage::user(request.user_message.as_str()),
        ];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: request.max_tokens,
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                warn!("{} call failed: {}", self.label, e);
                map_llm_error(&self.label, e)
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.label, response.prompt_tokens, response.completion_tokens
        );

        Ok(Generation {
            content: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edgequake_llm::LLMResponse;

    /// Provider whose `chat` yields a fixed result.
    struct StubProvider {
        reply: fn() -> Result<LLMResponse, LlmError>,
    }

    #[async_trait]
    impl LLMProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }

        fn max_context_length(&self) -> usize {
            128_000
        }

        async fn complete(&self, _prompt: &str) -> edgequake_llm::Result<LLMResponse> {
            Err(LlmError::NotSupported("complete".into()))
        }

        async fn complete_with_options(
            &self,
            _prompt: &str,
            _options: &CompletionOptions,
        ) -> edgequake_llm::Result<LLMResponse> {
            Err(LlmError::NotSupported("complete_with_options".into()))
        }

        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: Option<&CompletionOptions>,
        ) -> edgequake_llm::Result<LLMResponse> {
            (self.reply)()
        }
    }

    fn service(reply: fn() -> Result<LLMResponse, LlmError>) -> ProviderService {
        ProviderService::new(Arc::new(StubProvider { reply }), "anthropic")
    }

    struct Slow;

    impl GenerationService for Slow {
        fn provider_label(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _request: &ComparisonRequest) -> Result<Generation, CompareError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Generation::default())
        }
    }

    fn request() -> ComparisonRequest {
        ComparisonRequest {
            system_prompt: "sys".into(),
            user_message: "hello".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.1,
            max_tokens: None,
        }
    }

    async fn run(reply: fn() -> Result<LLMResponse, LlmError>) -> Result<Generation, CompareError> {
        generate_with_timeout(&service(reply), &request(), Duration::from_secs(5)).await
    }

    #[tokio::test]
    async fn timeout_is_a_distinct_error() {
        let err = generate_with_timeout(&Slow, &request(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::ApiTimeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn provider_timeout_keeps_its_kind() {
        let err = run(|| Err(LlmError::Timeout)).await.unwrap_err();
        assert!(matches!(err, CompareError::ApiTimeout { .. }), "got {err:?}");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn provider_auth_error_keeps_its_kind() {
        let err = run(|| Err(LlmError::AuthError("invalid x-api-key".into())))
            .await
            .unwrap_err();
        match err {
            CompareError::AuthError { provider, detail } => {
                assert_eq!(provider, "anthropic");
                assert_eq!(detail, "invalid x-api-key");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_rate_limit_is_transient() {
        let err = run(|| Err(LlmError::RateLimited("slow down".into())))
            .await
            .unwrap_err();
        assert!(
            matches!(err, CompareError::RateLimitExceeded { ref provider, .. } if provider == "anthropic"),
            "got {err:?}"
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn other_provider_errors_are_api_errors() {
        let err = run(|| Err(LlmError::ApiError("upstream exploded".into())))
            .await
            .unwrap_err();
        match err {
            CompareError::LlmApiError { message } => assert!(message.contains("upstream exploded")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!CompareError::LlmApiError { message: String::new() }.is_transient());
    }

    #[test]
    fn provider_answer_carries_tokens() {
        let out = tokio_test::block_on(run(|| {
            let mut r = LLMResponse::new("```csv\nA\n1\n```", "stub-model");
            r.prompt_tokens = 900;
            r.completion_tokens = 120;
            Ok(r)
        }))
        .unwrap();
        assert_eq!(out.content, "```csv\nA\n1\n```");
        assert_eq!(out.input_tokens, 900);
        assert_eq!(out.output_tokens, 120);
    }
}
