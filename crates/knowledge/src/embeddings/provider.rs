//! Embedding provider trait.

use crate::types::Embedding;
use docchat_core::AppResult;
use std::time::Duration;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Longest time `embed` may take before reporting the service unavailable.
    fn retry_budget(&self) -> Duration {
        Duration::ZERO
    }

    /// Embed a query.
    ///
    /// # Errors
    /// Returns `AppError::EmbeddingUnavailable` once every attempt has
    /// failed. Callers treat that as a transient, user-visible condition.
    async fn embed(&self, text: &str) -> AppResult<Embedding>;
}
