//! Prompt Relay - keeps the Gemini API key on the server.
//!
//! A browser posts `{ "prompt": ... }` to `/api/generate`. The relay forwards
//! the prompt to Gemini with the server-held credential and hands back the
//! answer in one of three shapes:
//! - `buffered`: the upstream JSON document, verbatim.
//! - `streaming`: the generated text as a chunked `text/plain` body.
//! - `passthrough`: the raw upstream SSE bytes as a chunked `text/plain` body.
//!
//! Bad input is a 400. Any upstream failure is a 500 with a generic message;
//! the detail only goes to the server log.

pub mod config;
pub mod error;
pub mod server;
pub mod streaming;
pub mod types;
pub mod upstream;

pub use config::{RelayConfig, RelayMode};
pub use error::{ConfigError, RelayError};
pub use server::serve;
