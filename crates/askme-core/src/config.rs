//! Configuration for the completion client

use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Settings handed to the client at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bearer credential, sent as-is and never validated locally
    pub api_key: String,

    /// Model identifier placed in every request
    pub model: String,

    /// Full URL of the chat completions endpoint
    pub endpoint: String,

    /// Connect timeout for the HTTP client (None = reqwest default)
    pub connect_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: None,
        }
    }
}

impl EngineConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read `OPENAI_API_KEY`, `ASKME_MODEL` and `ASKME_ENDPOINT`.
    ///
    /// Unset variables keep their defaults; a missing key stays empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = key;
        }
        if let Ok(model) = std::env::var("ASKME_MODEL") {
            config.model = model;
        }
        if let Ok(endpoint) = std::env::var("ASKME_ENDPOINT") {
            config.endpoint = endpoint;
        }
        config
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}
