//! Typed client for the widget API.
//!
//! Four operations over HTTP/JSON against a tenant-scoped base path:
//! fetch-config, send-message, submit-form, end-conversation. All calls are
//! plain request/response; no streaming. The trait seam exists so the
//! conversation runtime can be driven against a stub in tests.

pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod types;

pub use client::HttpWidgetClient;
pub use config::ClientConfig;
pub use error::WidgetApiError;
pub use notify::{AwaitedNotifier, BestEffortNotify, DetachedNotifier};
pub use types::{AgentReply, Faq, FormConfirmation, WidgetConfig};

use async_trait::async_trait;

use crate::forms::FormSubmission;
use crate::identity::{ConversationId, TenantKey, VisitorId};

/// The widget API boundary, opaque beyond its documented request/response
/// shapes.
#[async_trait]
pub trait WidgetApi: Send + Sync {
    /// Fetch the tenant's widget configuration.
    ///
    /// # Errors
    /// `TenantNotFound` when the tenant is unknown; `ServiceUnavailable` (or
    /// a transport error) otherwise. Callers render the two distinctly.
    async fn fetch_config(&self, tenant: &TenantKey) -> Result<WidgetConfig, WidgetApiError>;

    /// Send a visitor message.
    ///
    /// When `conversation` is absent the server starts a new conversation
    /// and the reply carries its freshly minted handle.
    ///
    /// # Errors
    /// Returns an error if the request fails; the caller recovers locally.
    async fn send_message(
        &self,
        tenant: &TenantKey,
        visitor: &VisitorId,
        text: &str,
        conversation: Option<&ConversationId>,
    ) -> Result<AgentReply, WidgetApiError>;

    /// Submit a locally validated form.
    ///
    /// # Errors
    /// Returns an error if the request fails; the caller recovers locally.
    async fn submit_form(
        &self,
        tenant: &TenantKey,
        visitor: &VisitorId,
        submission: &FormSubmission,
        conversation: &ConversationId,
    ) -> Result<FormConfirmation, WidgetApiError>;

    /// Signal that a conversation has ended, triggering server-side
    /// summarization.
    ///
    /// # Errors
    /// Returns an error if the request fails; callers treat the call as
    /// best-effort and swallow it.
    async fn end_conversation(&self, conversation: &ConversationId) -> Result<(), WidgetApiError>;
}
