//! Request handlers.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;

use docchat_knowledge::{RagOutcome, WARMING_UP_MESSAGE};
use docchat_llm::ChatMessage;

use crate::server::AppState;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far; the last message is the question.
    pub messages: Vec<ChatMessage>,
}

/// Plain-text response with an explicit status.
pub fn text_response(status: StatusCode, text: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)],
        text.into(),
    )
        .into_response()
}

fn error_response(message: &str) -> Response {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

// === Health ===

pub async fn health() -> &'static str {
    "OK"
}

// === Chat ===

/// Answer the last message of a conversation, streaming the model output.
///
/// - 200 streamed text: the model's answer, relayed fragment by fragment
/// - 200 plain text: the not-found sentence, the model was not called
/// - 503 plain text: the embedding model is still loading
/// - 500 plain text: anything else, decided before the first byte
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Rejected chat request: {}", e);
            return error_response(&format!("Invalid request body: {}", e));
        }
    };

    match state.pipeline.answer(&request.messages).await {
        Ok(RagOutcome::WarmingUp) => {
            text_response(StatusCode::SERVICE_UNAVAILABLE, WARMING_UP_MESSAGE)
        }
        Ok(RagOutcome::NotFound(text)) => text_response(StatusCode::OK, text),
        Ok(RagOutcome::Answer(fragments)) => {
            let fragments = fragments.inspect(|item| {
                if let Err(e) = item {
                    tracing::warn!("Answer stream interrupted: {}", e);
                }
            });

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)
                .body(Body::from_stream(fragments))
                .unwrap_or_else(|e| error_response(&e.to_string()))
        }
        Err(e) => {
            tracing::error!("Chat request failed: {}", e);
            error_response(&e.to_string())
        }
    }
}
