//! Configuration from environment variables.
//!
//! **Environment variables:**
//! - `GEMINI_API_KEY`: upstream credential (required)
//! - `PORT`: server port (default: 3000)
//! - `HOST`: bind address (default: 0.0.0.0)
//! - `RELAY_MODE`: `buffered`, `streaming` or `passthrough` (default: streaming)
//! - `GEMINI_MODEL`: upstream model id (default: gemini-1.5-pro-latest)
//! - `GEMINI_BASE_URL`: upstream base URL (default: https://generativelanguage.googleapis.com)
//! - `REQUEST_TIMEOUT_SECS`: upstream request timeout (default: none)

use crate::error::ConfigError;
use secrecy::SecretString;
use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// How the relay shapes its reply to the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelayMode {
    /// Wait for the full upstream document and return it as JSON.
    Buffered,
    /// Forward decoded text fragments as a `text/plain` chunked body.
    #[default]
    Streaming,
    /// Forward the raw upstream SSE bytes as a `text/plain` chunked body.
    Passthrough,
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buffered => "buffered",
            Self::Streaming => "streaming",
            Self::Passthrough => "passthrough",
        }
    }

    /// Whether the upstream call uses `streamGenerateContent`.
    pub fn is_streaming(&self) -> bool {
        !matches!(self, Self::Buffered)
    }
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buffered" | "json" => Ok(Self::Buffered),
            "streaming" | "stream" => Ok(Self::Streaming),
            "passthrough" | "raw" => Ok(Self::Passthrough),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub api_key: SecretString,
    pub mode: RelayMode,
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: Option<u64>,
}

impl RelayConfig {
    /// Config with defaults for everything except the credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: SecretString::from(api_key.into()),
            mode: RelayMode::default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let mut config = Self::new(api_key);

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: port,
            })?;
        }
        if let Some(mode) = get("RELAY_MODE") {
            config.mode = mode.parse()?;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = get("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(timeout) = get("REQUEST_TIMEOUT_SECS") {
            let secs = timeout
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid {
                    name: "REQUEST_TIMEOUT_SECS",
                    value: timeout,
                })?;
            config.request_timeout_secs = Some(secs);
        }

        Ok(config)
    }

    pub fn with_mode(mut self, mode: RelayMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
