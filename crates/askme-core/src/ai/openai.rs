use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::ExchangeError;
use crate::state::{ChatMessage, ChatRole};

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: ChatRole,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAIClient {
    pub fn new(config: EngineConfig) -> Result<Self, ExchangeError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(ExchangeError::from_transport)?;

        Ok(Self {
            client,
            api_key: config.api_key,
            model: config.model,
            endpoint: config.endpoint,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the whole history and return the first choice's raw text.
    pub async fn complete(&self, history: &[ChatMessage]) -> Result<String, ExchangeError> {
        let request = OpenAIRequest {
            model: &self.model,
            messages: history
                .iter()
                .map(|message| OpenAIMessage {
                    role: message.role,
                    content: &message.content,
                })
                .collect(),
        };

        debug!(model = %self.model, messages = history.len(), "dispatching completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ExchangeError::from_status(status, &text));
        }

        let openai_response: OpenAIResponse = response.json().await?;
        openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::malformed_reply("reply contained no choices"))?
            .message
            .content
            .ok_or_else(|| ExchangeError::malformed_reply("first choice has no message content"))
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "gpt-4o".to_string(),
            "gpt-4o-mini".to_string(),
            "gpt-4-turbo".to_string(),
            "gpt-4".to_string(),
            "gpt-3.5-turbo".to_string(),
        ]
    }
}
