//! Ollama Embedding Provider
//!
//! Embeds queries through Ollama's local `/api/embeddings` endpoint using
//! models like nomic-embed-text.
//!
//! The model server may still be loading when the first requests arrive, so
//! every call gets a bounded number of attempts, each with its own timeout
//! and a fixed pause in between.
//!
//! # Example
//! ```no_run
//! use docchat_core::config::EmbeddingConfig;
//! use docchat_knowledge::embeddings::{EmbeddingProvider, OllamaEmbedder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OllamaEmbedder::new(EmbeddingConfig::default());
//! let embedding = provider.embed("Do que trata o artigo?").await?;
//! assert_eq!(embedding.dimensions(), 768);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::EmbeddingProvider;
use crate::types::Embedding;
use async_trait::async_trait;
use docchat_core::config::EmbeddingConfig;
use docchat_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    /// Model name to use
    model: &'a str,
    /// Text to embed, already prefixed
    prompt: &'a str,
    /// How long the model stays loaded (-1 keeps it resident)
    keep_alive: i64,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    /// Embedding vector
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    /// Error message
    error: String,
}

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    /// HTTP client for API requests
    client: Client,
    config: EmbeddingConfig,
}

impl OllamaEmbedder {
    /// Create a provider for the configured endpoint and model.
    pub fn new(config: EmbeddingConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create a provider that shares an existing HTTP connection pool.
    pub fn with_client(config: EmbeddingConfig, client: Client) -> Self {
        Self { client, config }
    }

    /// Text actually submitted for a query.
    fn query_text(&self, text: &str) -> String {
        format!("{}{}", self.config.query_prefix, text)
    }

    /// Embed text with retry logic.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %self.config.model))]
    async fn embed_with_retries(&self, prompt: &str) -> AppResult<Embedding> {
        let attempts = self.config.max_attempts.max(1);
        let attempt_timeout = Duration::from_millis(self.config.attempt_timeout_ms);
        let backoff = Duration::from_millis(self.config.backoff_ms);

        for attempt in 1..=attempts {
            // Dropping the timed-out future aborts the request
            match tokio::time::timeout(attempt_timeout, self.embed_single(prompt)).await {
                Ok(Ok(embedding)) => return Ok(embedding),
                Ok(Err(e)) => {
                    warn!("Embedding failed (attempt {}/{}): {}", attempt, attempts, e);
                }
                Err(_) => {
                    warn!(
                        "Embedding timed out after {}ms (attempt {}/{})",
                        self.config.attempt_timeout_ms, attempt, attempts
                    );
                }
            }

            if attempt < attempts {
                debug!("Retrying embedding in {}ms", self.config.backoff_ms);
                tokio::time::sleep(backoff).await;
            }
        }

        Err(AppError::EmbeddingUnavailable { attempts })
    }

    /// Embed text (no retries)
    async fn embed_single(&self, prompt: &str) -> AppResult<Embedding> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            prompt,
            keep_alive: self.config.keep_alive,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                return Err(AppError::Embedding(format!(
                    "Ollama API error ({}): {}",
                    status, error_response.error
                )));
            }

            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let response_body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        if response_body.embedding.is_empty() {
            return Err(AppError::Embedding(
                "Ollama returned an empty embedding".to_string(),
            ));
        }

        debug!(
            "Generated {} dimensional embedding",
            response_body.embedding.len()
        );

        Ok(Embedding::new(response_body.embedding))
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn retry_budget(&self) -> Duration {
        self.config.retry_budget()
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "ollama"))]
    async fn embed(&self, text: &str) -> AppResult<Embedding> {
        let prompt = self.query_text(text);
        self.embed_with_retries(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config(server: &MockServer) -> EmbeddingConfig {
        EmbeddingConfig {
            endpoint: format!("{}/api/embeddings", server.uri()),
            attempt_timeout_ms: 500,
            backoff_ms: 20,
            ..Default::default()
        }
    }

    fn embedding_body(values: &[f32]) -> serde_json::Value {
        json!({ "embedding": values })
    }

    #[tokio::test]
    async fn test_embed_sends_prefixed_query() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(json!({
                "model": "nomic-embed-text",
                "prompt": "search_query: Quem é o autor?",
                "keep_alive": -1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[0.1, 0.2, 0.3])))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaEmbedder::new(create_test_config(&server));
        let embedding = provider.embed("Quem é o autor?").await.unwrap();

        assert_eq!(embedding.as_slice(), &[0.1, 0.2, 0.3]);
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
        assert_eq!(provider.retry_budget(), Duration::from_millis(1_540));
    }

    #[tokio::test]
    async fn test_recovers_after_two_failures() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "loading model"})))
            .up_to_n_times(2)
            .with_priority(1)
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[1.0, 0.0])))
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaEmbedder::new(create_test_config(&server));
        let embedding = provider.embed("oi").await.unwrap();

        assert_eq!(embedding.dimensions(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_after_timeouts() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(embedding_body(&[1.0]))
                    .set_delay(Duration::from_millis(400)),
            )
            .expect(3)
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            attempt_timeout_ms: 50,
            backoff_ms: 30,
            ..create_test_config(&server)
        };
        let provider = OllamaEmbedder::new(config);

        let started = Instant::now();
        let result = provider.embed("oi").await;

        assert!(matches!(
            result,
            Err(AppError::EmbeddingUnavailable { attempts: 3 })
        ));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_empty_vector_is_a_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[])))
            .expect(3)
            .mount(&server)
            .await;

        let provider = OllamaEmbedder::new(create_test_config(&server));
        let result = provider.embed("oi").await;

        assert!(matches!(result, Err(AppError::EmbeddingUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"vector": [1.0]})))
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            max_attempts: 1,
            ..create_test_config(&server)
        };
        let provider = OllamaEmbedder::new(config);

        let result = provider.embed("oi").await;
        assert!(matches!(
            result,
            Err(AppError::EmbeddingUnavailable { attempts: 1 })
        ));
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({"prompt": "query: oi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[0.5])))
            .expect(1)
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            query_prefix: "query: ".to_string(),
            ..create_test_config(&server)
        };
        let provider = OllamaEmbedder::new(config);

        assert!(provider.embed("oi").await.is_ok());
    }
}
