//! The widget session: identity, config, conversation, and lifecycle wired
//! together behind one façade.
//!
//! Nothing in this module throws past its boundary: every failure path
//! terminates in a transcript entry, a typed validation result, or the
//! blocking config-load error. The transcript mirrors what the visitor can
//! actually see.

pub mod lifecycle;

pub use lifecycle::{EndGuard, EndReason, LifecycleState};

use std::sync::Arc;

use thiserror::Error;

use crate::api::{
    AwaitedNotifier, BestEffortNotify, DetachedNotifier, WidgetApi, WidgetApiError, WidgetConfig,
};
use crate::conversation::{ConversationState, Message, Phase, ReplyDisposition, SendRejected};
use crate::forms::{FormFill, FormSchema, FormValidator, ValidationErrors};
use crate::identity::{get_or_create_visitor_id, IdentityStore, TenantKey, VisitorId};

/// Welcome message seeded when the tenant config doesn't carry one.
pub const DEFAULT_WELCOME: &str = "Hi there! How can I help you today?";

/// Errors that block the whole widget (full-screen state, nothing rendered).
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// The tenant is unknown; rendered as "chatbot not found".
    #[error("chatbot not found: {0}")]
    TenantNotFound(String),
    /// The config could not be loaded; rendered as a generic load failure.
    #[error("widget failed to load: {0}")]
    Unavailable(String),
    /// Local initialization failed.
    #[error("widget internal error: {0}")]
    Internal(String),
}

impl From<WidgetApiError> for ConfigLoadError {
    fn from(err: WidgetApiError) -> Self {
        match err {
            WidgetApiError::TenantNotFound(tenant) => Self::TenantNotFound(tenant),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Why a form submission did not reach the server.
#[derive(Debug)]
pub enum SubmitBlocked {
    /// Local validation failed; errors are rendered inline per field.
    Validation(ValidationErrors),
    /// The state machine rejected the submission.
    State(SendRejected),
}

impl std::fmt::Display for SubmitBlocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => {
                write!(f, "{} field(s) failed validation", errors.field_count())
            }
            Self::State(rejected) => write!(f, "{rejected}"),
        }
    }
}

impl std::error::Error for SubmitBlocked {}

impl From<SendRejected> for SubmitBlocked {
    fn from(rejected: SendRejected) -> Self {
        Self::State(rejected)
    }
}

/// Outcome of a form submission that passed local validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormOutcome {
    /// The server accepted the submission.
    Confirmed,
    /// The request failed; a notice was appended to the transcript and the
    /// hosting shell should show a transient notification. The form is not
    /// re-shown; free text keeps working.
    TransportFailed,
}

/// A live widget session for one tenant in one browsing context.
pub struct WidgetSession {
    tenant: TenantKey,
    store: Arc<dyn IdentityStore>,
    api: Arc<dyn WidgetApi>,
    config: WidgetConfig,
    visitor: VisitorId,
    welcome: String,
    validator: FormValidator,
    state: ConversationState,
    lifecycle: LifecycleState,
    end_guard: EndGuard,
    awaited: Box<dyn BestEffortNotify>,
    detached: Box<dyn BestEffortNotify>,
}

impl WidgetSession {
    /// Open a session: load identity, restore any persisted conversation
    /// handle, and fetch the tenant config.
    ///
    /// A restored handle means the conversation is resumed: the transcript
    /// is rebuilt fresh (only the welcome message shows) but every
    /// subsequent message appends to the same server-side conversation.
    ///
    /// # Errors
    /// `TenantNotFound` or `Unavailable` when the config cannot be fetched;
    /// these are the only errors that block the widget entirely.
    pub async fn open(
        tenant: TenantKey,
        store: Arc<dyn IdentityStore>,
        api: Arc<dyn WidgetApi>,
    ) -> Result<Self, ConfigLoadError> {
        let config = api.fetch_config(&tenant).await?;
        let validator =
            FormValidator::new().map_err(|e| ConfigLoadError::Internal(e.to_string()))?;

        let visitor = get_or_create_visitor_id(store.as_ref(), &tenant).await;
        let restored = match store.conversation(&tenant).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("conversation restore failed for tenant {tenant}: {e}");
                None
            }
        };

        let welcome = config
            .welcome_message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WELCOME.to_string());

        let (state, lifecycle) = match restored {
            Some(handle) => {
                tracing::debug!("resuming conversation {handle} for tenant {tenant}");
                (
                    ConversationState::resumed(&welcome, handle),
                    LifecycleState::Active,
                )
            }
            None => (ConversationState::new(&welcome), LifecycleState::NotStarted),
        };

        Ok(Self {
            tenant,
            store,
            api,
            config,
            visitor,
            welcome,
            validator,
            state,
            lifecycle,
            end_guard: EndGuard::new(),
            awaited: Box::new(AwaitedNotifier),
            detached: Box::new(DetachedNotifier),
        })
    }

    /// The tenant config fetched at open.
    #[must_use]
    pub const fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// The visitor identity in use.
    #[must_use]
    pub const fn visitor_id(&self) -> &VisitorId {
        &self.visitor
    }

    /// The append-only transcript.
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        self.state.transcript()
    }

    /// Current conversation phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        self.state.phase()
    }

    /// Whether a request is in flight (drives the typing indicator).
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// The live unsubmitted form, if any.
    #[must_use]
    pub const fn pending_form(&self) -> Option<&FormSchema> {
        self.state.pending_form()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Send a visitor message. Serialized: a second send while one is in
    /// flight is rejected, never interleaved.
    ///
    /// Transport failures do not propagate: they land in the transcript as
    /// a synthetic agent notice and the machine returns to `Idle` so the
    /// visitor can retry by sending again.
    ///
    /// # Errors
    /// Only state-machine rejections (`Busy`, `Ended`).
    pub async fn send_text(&mut self, text: &str) -> Result<(), SendRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        self.state.begin_send(text)?;
        if self.lifecycle == LifecycleState::NotStarted {
            self.lifecycle = LifecycleState::Active;
        }

        let conversation = self.state.handle().cloned();
        match self
            .api
            .send_message(&self.tenant, &self.visitor, text, conversation.as_ref())
            .await
        {
            Ok(reply) => {
                let disposition = self.state.apply_reply(reply);
                if disposition == (ReplyDisposition::Applied { adopted_handle: true }) {
                    if let Some(handle) = self.state.handle() {
                        if let Err(e) = self.store.set_conversation(&self.tenant, handle).await {
                            tracing::warn!("persisting conversation handle failed: {e}");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!("message send failed: {e}");
                self.state.apply_failure();
            }
        }

        Ok(())
    }

    /// Send a configured FAQ question as a visitor message.
    ///
    /// # Errors
    /// Only state-machine rejections (`Busy`, `Ended`).
    pub async fn ask_faq(&mut self, index: usize) -> Result<(), SendRejected> {
        let Some(question) = self.config.faqs.get(index).map(|faq| faq.question.clone())
        else {
            tracing::debug!("ignoring FAQ click for unknown index {index}");
            return Ok(());
        };
        self.send_text(&question).await
    }

    /// Validate and submit the pending form.
    ///
    /// Validation failures block the submission locally: nothing is sent
    /// and the errors are returned for inline rendering. A transport
    /// failure after successful validation is recovered like a failed send,
    /// reported as [`FormOutcome::TransportFailed`].
    ///
    /// # Errors
    /// `Validation` with per-field messages, or a state-machine rejection.
    pub async fn submit_form(&mut self, fill: FormFill) -> Result<FormOutcome, SubmitBlocked> {
        let Some(pending) = self.state.pending_form() else {
            return Err(SubmitBlocked::State(SendRejected::NoFormPending));
        };

        let errors = self.validator.validate(pending, &fill);
        if !errors.is_empty() {
            return Err(SubmitBlocked::Validation(errors));
        }

        let form = self.state.begin_form_submit()?;
        let submission = fill.into_submission(&form);

        let Some(conversation) = self.state.handle().cloned() else {
            // Forms only arrive attached to replies, which carry the handle.
            tracing::warn!("form submit without a conversation handle");
            self.state.apply_failure();
            return Ok(FormOutcome::TransportFailed);
        };

        match self
            .api
            .submit_form(&self.tenant, &self.visitor, &submission, &conversation)
            .await
        {
            Ok(confirmation) => {
                let text = if confirmation.message.trim().is_empty() {
                    form.success_message.clone()
                } else {
                    confirmation.message
                };
                self.state.apply_form_confirmation(&text);
                Ok(FormOutcome::Confirmed)
            }
            Err(e) => {
                tracing::warn!("form submit failed: {e}");
                self.state.apply_failure();
                Ok(FormOutcome::TransportFailed)
            }
        }
    }

    /// End the conversation.
    ///
    /// The end call is dispatched at most once per conversation no matter
    /// how many teardown paths fire; its outcome is swallowed. Local state
    /// always resets regardless: the persisted handle is cleared, and an
    /// explicit user action immediately reseeds a fresh conversation.
    pub async fn end(&mut self, reason: EndReason) {
        let handle = self.state.end();
        self.lifecycle = LifecycleState::Ending;

        if let Some(handle) = handle {
            if self.end_guard.try_claim() {
                tracing::debug!("dispatching end call for {handle} ({reason:?})");
                let notifier = match reason {
                    EndReason::PageUnload => &self.detached,
                    EndReason::UserAction | EndReason::Teardown => &self.awaited,
                };
                notifier.notify_end(Arc::clone(&self.api), handle).await;
            } else {
                tracing::debug!("end call already dispatched for this conversation");
            }
        }

        if let Err(e) = self.store.clear_conversation(&self.tenant).await {
            tracing::warn!("clearing conversation handle failed: {e}");
        }
        self.lifecycle = LifecycleState::Ended;

        if reason == EndReason::UserAction {
            self.reset_conversation();
        }
    }

    /// Start a fresh conversation after the current one ended.
    pub fn start_new_conversation(&mut self) {
        if self.lifecycle != LifecycleState::Ended {
            tracing::debug!("ignoring new-conversation request before the current one ended");
            return;
        }
        self.reset_conversation();
    }

    fn reset_conversation(&mut self) {
        self.state.reset(&self.welcome);
        self.end_guard = EndGuard::new();
        self.lifecycle = LifecycleState::NotStarted;
    }
}
