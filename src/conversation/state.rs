//! The conversation state machine.
//!
//! A single enumerated state with explicit transition functions replaces the
//! scattered boolean flags a UI layer tends to grow. Illegal states (a send
//! while one is already in flight, a reply applied after the conversation
//! ended) are rejected here, at the logic layer, not merely by disabling a
//! button.
//!
//! This machine is pure and synchronous: it owns the transcript, the current
//! phase, and the conversation handle, and it performs no I/O. The session
//! layer wires network calls around it.

use core::fmt;

use crate::api::AgentReply;
use crate::forms::FormSchema;
use crate::identity::ConversationId;

use super::types::Message;

/// Synthetic agent notice appended when a send or submit fails.
pub const FAILURE_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

/// Current phase of the conversation.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    /// No request in flight, no form pending.
    Idle,
    /// A message or form request is in flight. Exactly one at a time.
    Sending,
    /// An unsubmitted form is attached to the latest agent message. Free
    /// text input stays allowed; only the carried form is ever "live".
    FormPending(FormSchema),
    /// Terminal per conversation.
    Ended,
}

/// Why a send was rejected at the logic layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SendRejected {
    /// A request is already in flight; sends are strictly serialized.
    Busy,
    /// The conversation has ended; start a new one first.
    Ended,
    /// No form is pending to submit.
    NoFormPending,
}

impl fmt::Display for SendRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "a request is already in flight"),
            Self::Ended => write!(f, "the conversation has ended"),
            Self::NoFormPending => write!(f, "no form is pending"),
        }
    }
}

impl std::error::Error for SendRejected {}

/// What became of an applied reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyDisposition {
    /// Appended to the transcript.
    Applied {
        /// Whether this reply's handle was newly adopted (first response of
        /// the conversation) and should be persisted.
        adopted_handle: bool,
    },
    /// Arrived after the conversation ended and was discarded.
    DiscardedEnded,
}

/// In-memory conversation state: transcript, phase, and handle.
pub struct ConversationState {
    phase: Phase,
    transcript: Vec<Message>,
    handle: Option<ConversationId>,
}

impl ConversationState {
    /// Start a fresh conversation seeded with a welcome message.
    #[must_use]
    pub fn new(welcome: &str) -> Self {
        Self {
            phase: Phase::Idle,
            transcript: vec![Message::agent(welcome)],
            handle: None,
        }
    }

    /// Start a resumed conversation: the persisted handle is restored, but
    /// the transcript is rebuilt fresh with only the welcome message.
    #[must_use]
    pub fn resumed(welcome: &str, handle: ConversationId) -> Self {
        Self {
            phase: Phase::Idle,
            transcript: vec![Message::agent(welcome)],
            handle: Some(handle),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether a request is in flight (drives the typing indicator).
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Sending)
    }

    /// Whether the conversation has ended.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    /// The live unsubmitted form, if any.
    #[must_use]
    pub const fn pending_form(&self) -> Option<&FormSchema> {
        match &self.phase {
            Phase::FormPending(form) => Some(form),
            _ => None,
        }
    }

    /// The conversation handle, once adopted.
    #[must_use]
    pub const fn handle(&self) -> Option<&ConversationId> {
        self.handle.as_ref()
    }

    /// The append-only transcript.
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Begin sending a visitor message.
    ///
    /// Legal from `Idle` and from `FormPending` (the visitor may type past
    /// an unsubmitted form). Appends the visitor message and enters
    /// `Sending`, guaranteeing a single request in flight.
    ///
    /// # Errors
    /// `Busy` while another request is in flight; `Ended` after the
    /// conversation ended.
    pub fn begin_send(&mut self, text: &str) -> Result<(), SendRejected> {
        match self.phase {
            Phase::Sending => Err(SendRejected::Busy),
            Phase::Ended => Err(SendRejected::Ended),
            Phase::Idle | Phase::FormPending(_) => {
                self.transcript.push(Message::visitor(text));
                self.phase = Phase::Sending;
                Ok(())
            }
        }
    }

    /// Begin submitting the pending form, yielding its schema for the
    /// request build. Enters `Sending`.
    ///
    /// # Errors
    /// `Busy`/`Ended` as for [`Self::begin_send`]; `NoFormPending` when no
    /// form is live.
    pub fn begin_form_submit(&mut self) -> Result<FormSchema, SendRejected> {
        match core::mem::replace(&mut self.phase, Phase::Sending) {
            Phase::FormPending(form) => Ok(form),
            prior @ Phase::Sending => {
                self.phase = prior;
                Err(SendRejected::Busy)
            }
            prior @ Phase::Ended => {
                self.phase = prior;
                Err(SendRejected::Ended)
            }
            prior @ Phase::Idle => {
                self.phase = prior;
                Err(SendRejected::NoFormPending)
            }
        }
    }

    /// Apply a server reply to the in-flight request.
    ///
    /// The first reply's handle is adopted and reported for persistence;
    /// any later, different handle is ignored (first accepted value wins).
    /// Replies landing after `Ended` are discarded defensively.
    pub fn apply_reply(&mut self, reply: AgentReply) -> ReplyDisposition {
        if self.is_ended() {
            tracing::debug!("discarding reply that arrived after the conversation ended");
            return ReplyDisposition::DiscardedEnded;
        }

        let adopted_handle = if self.handle.is_none() {
            self.handle = Some(reply.conversation_id.clone());
            true
        } else {
            false
        };

        match reply.form_data {
            Some(form) => {
                self.transcript
                    .push(Message::agent_with_form(reply.message, form.clone()));
                self.phase = Phase::FormPending(form);
            }
            None => {
                self.transcript.push(Message::agent(reply.message));
                self.phase = Phase::Idle;
            }
        }

        ReplyDisposition::Applied { adopted_handle }
    }

    /// Apply a form confirmation to the in-flight submission.
    pub fn apply_form_confirmation(&mut self, text: &str) {
        if self.is_ended() {
            tracing::debug!("discarding confirmation that arrived after the conversation ended");
            return;
        }
        self.transcript.push(Message::agent(text));
        self.phase = Phase::Idle;
    }

    /// Apply a failed request: one synthetic agent notice, back to `Idle`.
    ///
    /// The transcript always reflects what the visitor saw happen, so the
    /// failure is an entry, not an exception.
    pub fn apply_failure(&mut self) {
        if self.is_ended() {
            tracing::debug!("discarding failure that arrived after the conversation ended");
            return;
        }
        self.transcript.push(Message::agent(FAILURE_NOTICE));
        self.phase = Phase::Idle;
    }

    /// End the conversation from any state. Terminal; yields the handle
    /// (exactly once) for the end call and clears it locally.
    pub fn end(&mut self) -> Option<ConversationId> {
        self.phase = Phase::Ended;
        self.handle.take()
    }

    /// Re-enter a fresh conversation: cleared handle, reseeded welcome
    /// message, no pending form.
    pub fn reset(&mut self, welcome: &str) {
        self.phase = Phase::Idle;
        self.transcript = vec![Message::agent(welcome)];
        self.handle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::types::MessageRole;
    use crate::forms::{FieldKind, FieldSpec};

    fn reply(handle: &str, text: &str) -> AgentReply {
        AgentReply {
            conversation_id: ConversationId::from_server(handle),
            message: text.to_string(),
            form_data: None,
        }
    }

    fn reply_with_form(handle: &str, text: &str) -> AgentReply {
        AgentReply {
            conversation_id: ConversationId::from_server(handle),
            message: text.to_string(),
            form_data: Some(FormSchema {
                id: "lead".to_string(),
                title: "Your details".to_string(),
                description: None,
                fields: vec![FieldSpec {
                    id: "email".to_string(),
                    kind: FieldKind::Email,
                    label: "Email".to_string(),
                    placeholder: None,
                    required: true,
                    options: None,
                    validation: None,
                }],
                success_message: "Thanks!".to_string(),
                require_terms_acceptance: false,
                terms_text: None,
            }),
        }
    }

    #[test]
    fn test_sends_are_serialized() {
        let mut state = ConversationState::new("Welcome!");

        assert!(state.begin_send("first").is_ok());
        // A second send before the first resolves is rejected at the logic
        // layer, not by a disabled button.
        assert_eq!(state.begin_send("second"), Err(SendRejected::Busy));
        assert!(state.is_busy());
    }

    #[test]
    fn test_handle_adoption_is_one_shot() {
        let mut state = ConversationState::new("Welcome!");

        state.begin_send("hi").unwrap();
        let first = state.apply_reply(reply("conv-1", "hello"));
        assert_eq!(first, ReplyDisposition::Applied { adopted_handle: true });
        assert_eq!(state.handle().unwrap().as_str(), "conv-1");

        state.begin_send("again").unwrap();
        // A misbehaving server returning a different handle must not
        // overwrite the first accepted value.
        let second = state.apply_reply(reply("conv-2", "hello again"));
        assert_eq!(second, ReplyDisposition::Applied { adopted_handle: false });
        assert_eq!(state.handle().unwrap().as_str(), "conv-1");
    }

    #[test]
    fn test_failure_recovers_to_idle() {
        let mut state = ConversationState::new("Welcome!");

        state.begin_send("hi").unwrap();
        state.apply_failure();

        assert_eq!(state.phase(), &Phase::Idle);
        let transcript = state.transcript();
        // welcome + visitor message + synthetic notice
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].role, MessageRole::Visitor);
        assert_eq!(transcript[2].role, MessageRole::Agent);
        assert_eq!(transcript[2].content, FAILURE_NOTICE);
    }

    #[test]
    fn test_form_reply_enters_form_pending() {
        let mut state = ConversationState::new("Welcome!");

        state.begin_send("I want a quote").unwrap();
        state.apply_reply(reply_with_form("conv-1", "Fill this in:"));

        assert!(state.pending_form().is_some());
        assert!(state.transcript().last().unwrap().attached_form.is_some());
    }

    #[test]
    fn test_free_text_is_allowed_past_a_pending_form() {
        let mut state = ConversationState::new("Welcome!");

        state.begin_send("quote please").unwrap();
        state.apply_reply(reply_with_form("conv-1", "Fill this in:"));

        // Typing past the form is legal; a formless reply supersedes it.
        assert!(state.begin_send("actually, another question").is_ok());
        state.apply_reply(reply("conv-1", "Sure."));
        assert!(state.pending_form().is_none());
        assert_eq!(state.phase(), &Phase::Idle);
    }

    #[test]
    fn test_form_submit_only_from_form_pending() {
        let mut state = ConversationState::new("Welcome!");
        assert_eq!(
            state.begin_form_submit().unwrap_err(),
            SendRejected::NoFormPending
        );

        state.begin_send("quote").unwrap();
        assert_eq!(state.begin_form_submit().unwrap_err(), SendRejected::Busy);

        state.apply_reply(reply_with_form("conv-1", "Fill this in:"));
        let form = state.begin_form_submit().unwrap();
        assert_eq!(form.id, "lead");
        assert!(state.is_busy());

        state.apply_form_confirmation("Thanks!");
        assert_eq!(state.phase(), &Phase::Idle);
    }

    #[test]
    fn test_reply_after_ended_is_discarded() {
        let mut state = ConversationState::new("Welcome!");

        state.begin_send("hi").unwrap();
        // The visitor closes the chat while the request is in flight.
        let handle = state.end();
        assert!(handle.is_none());

        let len_before = state.transcript().len();
        assert_eq!(
            state.apply_reply(reply("conv-1", "too late")),
            ReplyDisposition::DiscardedEnded
        );
        assert_eq!(state.transcript().len(), len_before);
        assert!(state.handle().is_none());
    }

    #[test]
    fn test_end_yields_handle_once() {
        let mut state = ConversationState::new("Welcome!");

        state.begin_send("hi").unwrap();
        state.apply_reply(reply("conv-1", "hello"));

        assert_eq!(state.end().unwrap().as_str(), "conv-1");
        assert!(state.end().is_none());
        assert!(state.is_ended());
    }

    #[test]
    fn test_sends_rejected_after_ended() {
        let mut state = ConversationState::new("Welcome!");
        state.end();
        assert_eq!(state.begin_send("hi"), Err(SendRejected::Ended));
    }

    #[test]
    fn test_reset_reseeds_welcome_and_clears_handle() {
        let mut state = ConversationState::new("Welcome!");
        state.begin_send("hi").unwrap();
        state.apply_reply(reply_with_form("conv-1", "form:"));
        state.end();

        state.reset("Welcome back!");
        assert_eq!(state.phase(), &Phase::Idle);
        assert!(state.handle().is_none());
        assert!(state.pending_form().is_none());
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript()[0].content, "Welcome back!");
    }

    #[test]
    fn test_resumed_conversation_keeps_handle_fresh_transcript() {
        let state =
            ConversationState::resumed("Welcome!", ConversationId::from_server("conv-old"));
        assert_eq!(state.handle().unwrap().as_str(), "conv-old");
        assert_eq!(state.transcript().len(), 1);
    }
}
