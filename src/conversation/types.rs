//! Transcript types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forms::FormSchema;

/// Who authored a transcript message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The person chatting through the widget.
    Visitor,
    /// The agent answering (including synthetic local notices).
    Agent,
}

/// One transcript entry.
///
/// The transcript is append-only and chronological; entries are never
/// reordered or deduplicated by content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
    /// Form attached to this (agent) message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_form: Option<FormSchema>,
    /// When the entry was appended locally.
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// Build a visitor message.
    #[must_use]
    pub fn visitor(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Visitor,
            content: content.into(),
            attached_form: None,
            sent_at: Utc::now(),
        }
    }

    /// Build an agent message.
    #[must_use]
    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Agent,
            content: content.into(),
            attached_form: None,
            sent_at: Utc::now(),
        }
    }

    /// Build an agent message carrying a form.
    #[must_use]
    pub fn agent_with_form(content: impl Into<String>, form: FormSchema) -> Self {
        Self {
            role: MessageRole::Agent,
            content: content.into(),
            attached_form: Some(form),
            sent_at: Utc::now(),
        }
    }
}
