pub mod ai;
pub mod compile;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use ai::OpenAIClient;
pub use compile::{compile_response, CompiledBlock, Fragment, FragmentKind, Inline};
pub use config::EngineConfig;
pub use engine::{ChatEngine, SubmitOutcome};
pub use error::ExchangeError;
pub use state::{ChatMessage, ChatRole, Conversation, EmptyInputError, RequestState};
