//! Exchange driver
//!
//! `ChatEngine` ties the conversation, the completion client and the reply
//! compiler together. It is a cheap handle: clones share the same state, so a
//! front end can move one into a spawned task and keep reading from another.
//!
//! ```rust,ignore
//! use askme_core::{ChatEngine, EngineConfig, OpenAIClient};
//!
//! let engine = ChatEngine::new(OpenAIClient::new(EngineConfig::from_env())?);
//! let outcome = engine.submit("Hi").await;
//! println!("{:?}", engine.history());
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::ai::OpenAIClient;
use crate::compile::compile_response;
use crate::error::ExchangeError;
use crate::state::{ChatMessage, Conversation, RequestState};

/// What happened to a submitted prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Prompt was blank; nothing changed
    Ignored,
    /// Another exchange is in flight; nothing changed
    Busy,
    /// The compiled assistant reply that was appended
    Replied(ChatMessage),
    /// The exchange failed; the error is now `last_error`
    Failed(ExchangeError),
}

#[derive(Debug, Default)]
struct EngineState {
    conversation: Conversation,
    request: RequestState,
}

#[derive(Clone)]
pub struct ChatEngine {
    client: OpenAIClient,
    inner: Arc<Mutex<EngineState>>,
}

/// Releases the pending flag when dropped, however the exchange ends.
struct PendingGuard {
    inner: Arc<Mutex<EngineState>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        lock(&self.inner).request.pending = false;
    }
}

fn lock(inner: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    // Appends are the only mutations, so state behind a poisoned lock is still whole.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatEngine {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            inner: Arc::new(Mutex::new(EngineState::default())),
        }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Run one exchange for `prompt`.
    ///
    /// The user turn is appended before the request goes out, and stays in the
    /// history whether or not the exchange succeeds.
    pub async fn submit(&self, prompt: &str) -> SubmitOutcome {
        if prompt.trim().is_empty() {
            debug!("ignoring blank prompt");
            return SubmitOutcome::Ignored;
        }

        let (history, guard) = {
            let mut state = lock(&self.inner);
            if state.request.pending {
                warn!("exchange already pending, rejecting submission");
                return SubmitOutcome::Busy;
            }
            if state.conversation.append_user(prompt).is_err() {
                return SubmitOutcome::Ignored;
            }
            state.request.pending = true;

            let guard = PendingGuard {
                inner: Arc::clone(&self.inner),
            };
            (state.conversation.history().to_vec(), guard)
        };

        info!(turns = history.len(), model = %self.client.model(), "exchange started");
        let result = self.client.complete(&history).await;

        let mut state = lock(&self.inner);
        let outcome = match result {
            Ok(raw) => {
                let message = state.conversation.append_assistant(compile_response(&raw));
                state.request.last_error = None;
                info!(reply_len = raw.len(), "exchange completed");
                SubmitOutcome::Replied(message)
            }
            Err(err) => {
                warn!(error = %err, "exchange failed");
                state.request.last_error = Some(err.to_string());
                SubmitOutcome::Failed(err)
            }
        };

        // Release the lock before the guard takes it again.
        drop(state);
        drop(guard);
        outcome
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        lock(&self.inner).conversation.history().to_vec()
    }

    pub fn request_state(&self) -> RequestState {
        lock(&self.inner).request.clone()
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.inner).request.pending
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.inner).request.last_error.clone()
    }
}
