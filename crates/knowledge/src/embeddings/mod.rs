//! Query embedding.
//!
//! Turns the user's question into a vector comparable with stored passages.

pub mod provider;
pub mod providers;

pub use provider::EmbeddingProvider;
pub use providers::OllamaEmbedder;
