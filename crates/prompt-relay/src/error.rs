//! Relay error types.
//!
//! Only two messages ever reach the client: one for bad input and one for
//! everything that went wrong upstream. The detailed variants exist for the
//! server-side log.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

pub const PROMPT_REQUIRED: &str = "Prompt is required";
pub const UPSTREAM_FAILED: &str = "Failed to get response from AI service.";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("prompt is missing or empty")]
    InvalidPrompt,

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream stream error: {0}")]
    Stream(String),
}

impl RelayError {
    /// Message that is safe to send across the trust boundary.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidPrompt => PROMPT_REQUIRED,
            _ => UPSTREAM_FAILED,
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPrompt => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.public_message())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("unknown relay mode {0:?} (expected buffered, streaming or passthrough)")]
    UnknownMode(String),
}
