//! LLM integration crate for docchat.
//!
//! Streams chat completions from a locally hosted model server and flattens
//! its newline-delimited JSON event stream into plain text fragments.
//!
//! # Example
//! ```no_run
//! use docchat_core::config::CompletionConfig;
//! use docchat_llm::{ChatMessage, CompletionClient, OllamaChatClient};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaChatClient::new(CompletionConfig::default());
//! let history = vec![ChatMessage::user("Qual é o tema do artigo?")];
//! let mut fragments = client.stream_chat("Responda em português.", &history).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod providers;
pub mod stream;

// Re-export main types
pub use client::{ChatMessage, CompletionClient, FragmentStream, Role};
pub use providers::OllamaChatClient;
pub use stream::{decode_fragments, StreamDecoder, StreamEvent};
