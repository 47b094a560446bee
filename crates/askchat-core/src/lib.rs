pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use ai::{AnswerClient, DEFAULT_ENDPOINT};
pub use config::Config;
pub use conversation::{AnswerRequest, Conversation};
pub use error::{AnswerOutcome, AskError};
pub use state::{ChatMessage, ChatRole, ConversationState, DEFAULT_FALLBACK_MESSAGE};
