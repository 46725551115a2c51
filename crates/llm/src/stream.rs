//! Newline-delimited JSON stream decoding.
//!
//! The model server frames a streamed answer as one JSON object per line:
//! content fragments, metadata-only lines and a final `done` line. Reads from
//! the transport can split a line (or a multi-byte UTF-8 character) at any
//! byte offset, so bytes are buffered until a full line is available.
//!
//! Decoding is tolerant: a line that is not valid JSON, has an unexpected
//! shape, or carries no content is skipped rather than failing the stream.

use crate::client::FragmentStream;
use bytes::Bytes;
use docchat_core::AppResult;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;

/// One decoded line of the upstream event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamEvent {
    /// Content fragment carried by the line, if any
    pub content: Option<String>,

    /// Whether the upstream marked this as the final event
    pub done: bool,
}

/// Wire shape of a line: `{"message": {"content": "..."}, "done": false, ...}`.
#[derive(Debug, Deserialize)]
struct WireLine {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

impl StreamEvent {
    /// Parse one complete line. Returns `None` for blank or malformed lines.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        let wire: WireLine = match serde_json::from_slice(line) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::debug!("Skipping malformed stream line: {}", e);
                return None;
            }
        };

        if let Some(error) = wire.error {
            tracing::warn!("Upstream reported an error mid-stream: {}", error);
        }

        Some(Self {
            content: wire.message.and_then(|m| m.content),
            done: wire.done,
        })
    }

    /// The content fragment, if present and non-empty.
    pub fn into_fragment(self) -> Option<String> {
        self.content.filter(|c| !c.is_empty())
    }
}

/// Incremental line splitter over raw transport bytes.
///
/// Each decoder belongs to a single response; it holds the partial line left
/// over from the previous read.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the fragments of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let scan_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        let mut line_start = 0;

        for (offset, byte) in self.buffer[scan_from..].iter().enumerate() {
            if *byte == b'\n' {
                let line_end = scan_from + offset;
                if let Some(fragment) = fragment_from_line(&self.buffer[line_start..line_end]) {
                    fragments.push(fragment);
                }
                line_start = line_end + 1;
            }
        }

        self.buffer.drain(..line_start);
        fragments
    }

    /// Flush the unterminated trailing line once the transport has closed.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        fragment_from_line(&rest)
    }

    /// Bytes held back waiting for a newline.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn fragment_from_line(line: &[u8]) -> Option<String> {
    StreamEvent::parse(line).and_then(StreamEvent::into_fragment)
}

struct DecodeState {
    upstream: Pin<Box<dyn Stream<Item = AppResult<Bytes>> + Send>>,
    decoder: StreamDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw byte stream into a stream of text fragments.
///
/// A transport error is forwarded once and ends the stream.
pub fn decode_fragments<S>(upstream: S) -> FragmentStream
where
    S: Stream<Item = AppResult<Bytes>> + Send + 'static,
{
    let state = DecodeState {
        upstream: Box::pin(upstream),
        decoder: StreamDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.pending.pop_front() {
                return Some((Ok(fragment), state));
            }

            if state.finished {
                return None;
            }

            match state.upstream.next().await {
                Some(Ok(chunk)) => {
                    let fragments = state.decoder.push(&chunk);
                    state.pending.extend(fragments);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.finished = true;
                    if let Some(fragment) = state.decoder.finish() {
                        state.pending.push_back(fragment);
                    }
                }
            }
        }
    }))
}
