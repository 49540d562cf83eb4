use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Why an exchange with the completion endpoint failed.
///
/// `Display` is the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// The endpoint answered with a non-success status
    #[error("Status: {status} - {message}")]
    Server { status: u16, message: String },

    /// The request went out but nothing came back
    #[error("Error: No response received from the server.")]
    NoResponse,

    /// The request could not be built or sent, or the reply had the wrong shape
    #[error("Error: {0}")]
    RequestSetup(String),
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

impl ExchangeError {
    /// Classify a non-success response from its status and raw body.
    ///
    /// The body's `error.message` wins; otherwise the status's reason phrase.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|body| body.error.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());

        ExchangeError::Server {
            status: status.as_u16(),
            message,
        }
    }

    /// Classify a failure raised by the HTTP client.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(status, "");
        }

        if err.is_connect() || err.is_timeout() || err.is_request() {
            return ExchangeError::NoResponse;
        }

        ExchangeError::RequestSetup(err.to_string())
    }

    pub fn malformed_reply(detail: impl Into<String>) -> Self {
        ExchangeError::RequestSetup(detail.into())
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        Self::from_transport(err)
    }
}
