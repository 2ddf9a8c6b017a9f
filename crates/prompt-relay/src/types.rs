//! Wire types.
//!
//! The inbound side is a single `{ "prompt": string }` object from the
//! browser. The outbound side is the minimal Gemini `generateContent` body,
//! plus the subset of the streaming chunk shape needed to pull text out.

use crate::error::RelayError;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl PromptRequest {
    /// Returns the prompt if present and non-empty.
    ///
    /// Whitespace-only prompts are forwarded as-is.
    pub fn into_prompt(self) -> Result<String, RelayError> {
        match self.prompt {
            Some(p) if !p.is_empty() => Ok(p),
            _ => Err(RelayError::InvalidPrompt),
        }
    }
}

/// `{ "contents": [{ "parts": [{ "text": ... }] }] }`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content<'a> {
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Part<'a> {
    pub text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    pub fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

// Streaming chunk types. Unknown fields are ignored and every level defaults,
// so chunks carrying only usage metadata or a finish reason decode cleanly.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: CandidateContent,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl StreamChunk {
    /// Text parts of the first candidate, in order, skipping empty ones.
    pub fn into_texts(self) -> Vec<String> {
        self.candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
