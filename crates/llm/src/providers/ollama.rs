//! Ollama chat provider.
//!
//! Streams answers from Ollama's `/api/chat` endpoint.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{ChatMessage, CompletionClient, FragmentStream};
use crate::stream::decode_fragments;
use docchat_core::config::CompletionConfig;
use docchat_core::{AppError, AppResult};
use futures::StreamExt;
use serde::Serialize;
use tracing::instrument;

/// Ollama chat request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
    keep_alive: i64,
}

/// Sampling and sizing options.
#[derive(Debug, Clone, Copy, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_ctx: u32,
    num_predict: u32,
    num_thread: u32,
}

/// Streaming chat client for Ollama.
#[derive(Debug, Clone)]
pub struct OllamaChatClient {
    config: CompletionConfig,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaChatClient {
    /// Create a client for the configured endpoint and model.
    pub fn new(config: CompletionConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a client that shares an existing HTTP connection pool.
    pub fn with_client(config: CompletionConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Build the request body: system instruction first, then the history verbatim.
    fn to_ollama_request<'a>(
        &'a self,
        system_instruction: &str,
        history: &[ChatMessage],
    ) -> OllamaChatRequest<'a> {
        let messages = std::iter::once(ChatMessage::system(system_instruction))
            .chain(history.iter().cloned())
            .collect();

        OllamaChatRequest {
            model: &self.config.model,
            messages,
            stream: true,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_ctx: self.config.num_ctx,
                num_predict: self.config.num_predict,
                num_thread: self.config.num_thread,
            },
            keep_alive: self.config.keep_alive,
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for OllamaChatClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip_all, fields(model = %self.config.model, messages = history.len() + 1))]
    async fn stream_chat(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
    ) -> AppResult<FragmentStream> {
        tracing::info!("Starting streaming chat request to Ollama");

        let request = self.to_ollama_request(system_instruction, history);

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to send chat request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Upstream(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        tracing::debug!("Ollama accepted chat request, relaying stream");

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| AppError::Upstream(format!("Stream error: {}", e))));

        Ok(decode_fragments(bytes))
    }
}
