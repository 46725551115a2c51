//! Completion backends.

pub mod ollama;

pub use ollama::OllamaChatClient;
