//! Embedding backends.

pub mod ollama;

pub use ollama::OllamaEmbedder;
