//! RAG answering orchestration.

use crate::embeddings::{EmbeddingProvider, OllamaEmbedder};
use crate::store::{PassageStore, PgPassageStore, SearchParams};
use crate::types::RetrievedPassage;
use docchat_core::{AppConfig, AppError, AppResult};
use docchat_llm::{ChatMessage, CompletionClient, FragmentStream, OllamaChatClient};
use docchat_prompt::{resolve_prompt, Composition, PromptComposer};
use std::sync::Arc;
use std::time::Duration;

/// What a conversation turn resolved to.
pub enum RagOutcome {
    /// The embedding service did not answer in time; nothing else ran.
    WarmingUp,

    /// No relevant passage; the model was not called.
    NotFound(String),

    /// Answer fragments streamed from the model.
    Answer(FragmentStream),
}

impl std::fmt::Debug for RagOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RagOutcome::WarmingUp => f.write_str("WarmingUp"),
            RagOutcome::NotFound(text) => f.debug_tuple("NotFound").field(text).finish(),
            RagOutcome::Answer(_) => f.write_str("Answer(..)"),
        }
    }
}

/// The request pipeline: embed, search, compose, complete.
///
/// Holds only shared, immutable components; each call to `answer` is
/// independent.
#[derive(Clone)]
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn PassageStore>,
    completion: Arc<dyn CompletionClient>,
    composer: Arc<PromptComposer>,
    params: SearchParams,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn PassageStore>,
        completion: Arc<dyn CompletionClient>,
        composer: PromptComposer,
        params: SearchParams,
    ) -> Self {
        Self {
            embedder,
            store,
            completion,
            composer: Arc::new(composer),
            params,
        }
    }

    /// Build the production pipeline: Ollama for embeddings and chat,
    /// Postgres for passages.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let http = reqwest::Client::new();

        let embedder = OllamaEmbedder::with_client(config.embedding.clone(), http.clone());
        let completion = OllamaChatClient::with_client(config.completion.clone(), http);
        let store = PgPassageStore::connect(&config.database).await?;

        let definition = resolve_prompt(config.prompt_file.as_deref())?;
        let composer = PromptComposer::from_definition(definition)?;

        tracing::info!(
            "Pipeline ready: embeddings {} ({}), completion {} ({}), store {}",
            embedder.model_name(),
            embedder.provider_name(),
            config.completion.model,
            completion.provider_name(),
            store.backend_name()
        );

        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(store),
            Arc::new(completion),
            composer,
            SearchParams::from(&config.retrieval),
        ))
    }

    /// Longest time retrieval may spend before reporting warm-up.
    pub fn embedding_budget(&self) -> Duration {
        self.embedder.retry_budget()
    }

    /// Answer the last message of a conversation.
    ///
    /// The whole conversation is forwarded to the model after the grounded
    /// system instruction.
    ///
    /// # Errors
    /// `AppError::InvalidRequest` for an empty conversation; search,
    /// prompt and completion failures are propagated. An unavailable
    /// embedding service is not an error but `RagOutcome::WarmingUp`.
    pub async fn answer(&self, messages: &[ChatMessage]) -> AppResult<RagOutcome> {
        let query = messages
            .last()
            .map(|m| m.content.as_str())
            .ok_or_else(|| AppError::InvalidRequest("Conversation is empty".to_string()))?;

        tracing::info!("Answering query ({} chars, {} messages)", query.len(), messages.len());

        let Some(passages) = self.retrieve(query).await? else {
            return Ok(RagOutcome::WarmingUp);
        };

        self.answer_with_passages(messages, &passages).await
    }

    /// Answer a conversation from passages that were already retrieved.
    ///
    /// No embedding or search happens here.
    pub async fn answer_with_passages(
        &self,
        messages: &[ChatMessage],
        passages: &[RetrievedPassage],
    ) -> AppResult<RagOutcome> {
        if messages.is_empty() {
            return Err(AppError::InvalidRequest("Conversation is empty".to_string()));
        }

        let composition = self
            .composer
            .compose(passages.iter().map(|p| p.content.as_str()))?;
        tracing::debug!(
            "Composed {} chars from {} passage(s)",
            composition.text().len(),
            passages.len()
        );

        match composition {
            Composition::NotFound(text) => {
                tracing::info!("No passage above threshold {}", self.params.threshold);
                Ok(RagOutcome::NotFound(text))
            }
            Composition::Instruction(instruction) => {
                let stream = self.completion.stream_chat(&instruction, messages).await?;
                Ok(RagOutcome::Answer(stream))
            }
        }
    }

    /// Embed a query and search the store.
    ///
    /// Returns `None` when the embedding service is unavailable.
    pub async fn retrieve(&self, query: &str) -> AppResult<Option<Vec<RetrievedPassage>>> {
        let embedding = match self.embedder.embed(query).await {
            Ok(embedding) => embedding,
            Err(AppError::EmbeddingUnavailable { attempts }) => {
                tracing::warn!("Embedding service unavailable after {} attempts", attempts);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let passages = self.store.search(&embedding, &self.params).await?;

        tracing::debug!("Retrieved {} passage(s)", passages.len());
        for passage in &passages {
            tracing::debug!(similarity = passage.similarity, "{}", passage.content);
        }

        Ok(Some(passages))
    }
}
