//! Response types for the widget API.

use serde::{Deserialize, Serialize};

use crate::forms::FormSchema;
use crate::identity::ConversationId;

/// Tenant-level widget configuration fetched on load.
///
/// Servers may carry more fields than the widget consumes; unknown keys are
/// ignored and most known keys are optional so a sparse config still loads.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Display name of the chat agent.
    pub name: String,
    /// Primary theme color (CSS color string).
    #[serde(default)]
    pub theme_color: Option<String>,
    /// First agent message seeded into every fresh conversation.
    #[serde(default)]
    pub welcome_message: Option<String>,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Clickable FAQ entries offered before/next to the input box.
    #[serde(default)]
    pub faqs: Vec<Faq>,
    /// Launcher button background color.
    #[serde(default)]
    pub widget_button_color: Option<String>,
    /// Launcher button label.
    #[serde(default)]
    pub widget_button_text: Option<String>,
}

/// A frequently-asked question the visitor can click instead of typing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Faq {
    /// The question, sent verbatim as a visitor message when clicked.
    pub question: String,
    /// The canned answer configured server-side.
    #[serde(default)]
    pub answer: Option<String>,
}

/// Server response to a sent message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    /// Handle of the conversation this reply belongs to. On the first reply
    /// of a conversation this is freshly minted; the client adopts it once
    /// and never lets a later value overwrite it.
    pub conversation_id: ConversationId,
    /// Agent message text.
    pub message: String,
    /// Form pushed down mid-conversation, if any.
    #[serde(default)]
    pub form_data: Option<FormSchema>,
}

/// Server response to a form submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormConfirmation {
    /// Confirmation text to append as an agent message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_widget_config_deserializes() {
        let config: WidgetConfig = serde_json::from_str(r#"{"name": "Acme Support"}"#).unwrap();
        assert_eq!(config.name, "Acme Support");
        assert!(config.faqs.is_empty());
        assert!(config.welcome_message.is_none());
    }

    #[test]
    fn test_agent_reply_without_form() {
        let reply: AgentReply = serde_json::from_str(
            r#"{"conversation_id": "conv-7", "message": "Hello!"}"#,
        )
        .unwrap();
        assert_eq!(reply.conversation_id.as_str(), "conv-7");
        assert!(reply.form_data.is_none());
    }
}
