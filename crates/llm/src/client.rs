//! Chat completion abstraction and conversation types.

use docchat_core::AppResult;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a conversation, forwarded to the model as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Lazy, finite sequence of answer text fragments.
///
/// The stream ends when the upstream transport closes; there is no trailing
/// sentinel item. Dropping it aborts the upstream request.
pub type FragmentStream = Pin<Box<dyn Stream<Item = AppResult<String>> + Send>>;

/// Trait for streaming chat completion backends.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Start a token-streamed chat completion.
    ///
    /// `system_instruction` is sent as a leading system message, followed by
    /// `history` in its original order.
    ///
    /// # Errors
    /// Returns `AppError::Upstream` when the request cannot be sent or the
    /// service answers with a non-success status. No fragment has been
    /// produced in that case.
    async fn stream_chat(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
    ) -> AppResult<FragmentStream>;
}
