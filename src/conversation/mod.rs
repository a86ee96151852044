//! Conversation state: transcript, phase, and transition rules.

pub mod state;
pub mod types;

pub use state::{ConversationState, Phase, ReplyDisposition, SendRejected, FAILURE_NOTICE};
pub use types::{Message, MessageRole};
