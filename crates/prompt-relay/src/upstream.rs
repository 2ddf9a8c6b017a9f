//! Google Gemini client.
//!
//! Exactly one request per relayed prompt. No retries: a failure is reported
//! to the caller as-is.

use crate::{config::RelayConfig, error::RelayError, types::GenerateContentRequest};
use bytes::Bytes;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url_trimmed().to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    async fn post(&self, url: &str, prompt: &str) -> Result<Response, RelayError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "calling upstream");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Upstream { status, body });
        }

        Ok(response)
    }

    /// Single-shot call. Returns the upstream JSON document untouched.
    pub async fn generate(&self, prompt: &str) -> Result<Bytes, RelayError> {
        let response = self.post(&self.generate_url(), prompt).await?;
        Ok(response.bytes().await?)
    }

    /// Streaming call. Returns the response once the upstream has accepted the
    /// request; the body is still unread.
    pub async fn stream_generate(&self, prompt: &str) -> Result<Response, RelayError> {
        self.post(&self.stream_url(), prompt).await
    }
}
