//! Streaming conversion (SSE).
//!
//! Gemini's `streamGenerateContent?alt=sse` answers with Server-Sent Events
//! whose `data:` lines carry JSON chunks. The browser only wants the text, so
//! this module decodes the upstream SSE incrementally and yields each text
//! part as soon as its event is complete.

use crate::error::RelayError;
use crate::types::StreamChunk;
use async_stream::try_stream;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use std::fmt::Display;

const MAX_SSE_BUFFER: usize = 10 * 1024 * 1024;
const DONE_MARKER: &str = "[DONE]";

/// Incremental SSE event splitter.
///
/// Bytes are buffered until a blank line closes an event. Line endings are
/// normalized to `\n`, including a `\r\n` pair split across two chunks.
/// Multi-byte UTF-8 sequences are only decoded once the whole event is
/// buffered, so chunk boundaries never corrupt text.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    last_was_cr: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the data payloads of every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, RelayError> {
        for &b in chunk {
            match b {
                b'\r' => {
                    self.buffer.push(b'\n');
                    self.last_was_cr = true;
                }
                b'\n' if self.last_was_cr => self.last_was_cr = false,
                _ => {
                    self.buffer.push(b);
                    self.last_was_cr = false;
                }
            }
        }

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(payload) = parse_event_payload(&String::from_utf8_lossy(&event)) {
                payloads.push(payload);
            }
        }

        if self.buffer.len() > MAX_SSE_BUFFER {
            return Err(RelayError::Stream(
                "SSE buffer exceeded maximum size".to_string(),
            ));
        }

        Ok(payloads)
    }

    /// Payload of a trailing event the upstream never terminated.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        if text.trim().is_empty() {
            return None;
        }
        parse_event_payload(&text)
    }
}

/// Join the `data:` lines of one event. Comments and other fields are skipped.
fn parse_event_payload(event: &str) -> Option<String> {
    let mut payload_lines = Vec::new();
    for line in event.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            payload_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    if payload_lines.is_empty() {
        None
    } else {
        Some(payload_lines.join("\n"))
    }
}

fn decode_payload(payload: &str) -> Result<Vec<String>, RelayError> {
    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|e| RelayError::Stream(format!("failed to parse upstream SSE json: {}", e)))?;
    Ok(chunk.into_texts())
}

/// Turn an upstream SSE byte stream into the ordered text fragments it carries.
pub fn text_fragments<S, E>(body: S) -> impl Stream<Item = Result<String, RelayError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    try_stream! {
        let mut decoder = SseDecoder::new();
        futures::pin_mut!(body);

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| RelayError::Stream(e.to_string()))?;
            for payload in decoder.push(&chunk)? {
                if payload.trim() == DONE_MARKER {
                    return;
                }
                for text in decode_payload(&payload)? {
                    yield text;
                }
            }
        }

        if let Some(payload) = decoder.finish() {
            if payload.trim() != DONE_MARKER {
                for text in decode_payload(&payload)? {
                    yield text;
                }
            }
        }
    }
}

/// Relay the upstream bytes untouched.
pub fn passthrough<S, E>(body: S) -> impl Stream<Item = Result<Bytes, RelayError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    body.map(|r| r.map_err(|e| RelayError::Stream(e.to_string())))
}

/// Wait for the first item before committing to a response.
///
/// A failure on the first item is returned as an error so the caller can
/// still answer with a plain error status. Later failures stay in the stream.
pub async fn prime<S, T>(
    mut items: S,
) -> Result<impl Stream<Item = Result<T, RelayError>>, RelayError>
where
    S: Stream<Item = Result<T, RelayError>> + Unpin,
{
    let first = items.next().await.transpose()?;
    Ok(stream::iter(first.map(Ok)).chain(items))
}
