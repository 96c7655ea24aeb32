// Completion provider abstraction
//
// Every model call in the solver goes through `LlmProvider`. Concrete vendors
// differ only in wire format; model choice and sampling parameters are
// configuration values, not types.

use async_trait::async_trait;

pub mod factory;
pub mod openai;
pub mod retry;
pub mod types;

pub use factory::{create_provider, create_provider_from_entry};
pub use openai::OpenAIProvider;
pub use retry::{with_retry, RetryPolicy};
pub use types::{
    estimate_prompt_tokens, estimate_tokens, Completion, CompletionRequest, Message,
    ProviderError, Usage,
};

/// Trait for chat completion providers
///
/// Implementors provide a single-shot `complete_once`; callers use
/// `complete`, which retries transient failures with randomized exponential
/// backoff according to `retry_policy`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one request without retrying
    async fn complete_once(&self, request: &CompletionRequest) -> Result<Completion, ProviderError>;

    /// Send a request, retrying retryable failures
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let policy = self.retry_policy();
        with_retry(&policy, || self.complete_once(request)).await
    }

    /// Backoff policy applied by `complete`
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    /// Provider name (e.g. "openai", "azure")
    fn name(&self) -> &str;

    /// Model identifier sent with each request
    fn model(&self) -> &str;
}
