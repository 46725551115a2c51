//! Retrieval for docchat.
//!
//! Embeds questions through Ollama, searches passages stored in Postgres with
//! pgvector, and drives the retrieval-augmented answer pipeline.

pub mod embeddings;
pub mod rag;
pub mod similarity;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{EmbeddingProvider, OllamaEmbedder};
pub use rag::{RagOutcome, RagPipeline, WARMING_UP_MESSAGE};
pub use similarity::{cosine_similarity, rank};
pub use store::{InMemoryPassageStore, PassageStore, PgPassageStore, SearchParams};
pub use types::{Embedding, Passage, RetrievedPassage, StoreStats};
