//! Best-effort delivery of the end-of-conversation signal.
//!
//! The end call must be dispatchable from two very different moments: a
//! normal teardown where awaiting the request is fine, and a page-unload
//! analog where the initiating scope is about to be destroyed and nothing
//! may block. Both flavors swallow every failure; ending is best-effort and
//! never surfaces to the visitor.

use std::sync::Arc;

use async_trait::async_trait;

use crate::identity::ConversationId;

use super::WidgetApi;

/// A send operation whose success is not confirmed to the caller and whose
/// completion may outlive the initiating scope.
#[async_trait]
pub trait BestEffortNotify: Send + Sync {
    /// Dispatch the end call for a conversation. Infallible by contract.
    async fn notify_end(&self, api: Arc<dyn WidgetApi>, conversation: ConversationId);
}

/// Sends the end call and waits for it to finish.
///
/// Used for explicit user action and normal component teardown, where the
/// caller is still alive to await the request.
pub struct AwaitedNotifier;

#[async_trait]
impl BestEffortNotify for AwaitedNotifier {
    async fn notify_end(&self, api: Arc<dyn WidgetApi>, conversation: ConversationId) {
        if let Err(e) = api.end_conversation(&conversation).await {
            tracing::warn!("end call for {conversation} failed: {e}");
        }
    }
}

/// Hands the end call to the runtime and returns immediately.
///
/// The beacon analog: the request is queued on the executor and completes
/// (or fails, silently) after the caller has moved on, even if the widget
/// scope that initiated it is gone.
pub struct DetachedNotifier;

#[async_trait]
impl BestEffortNotify for DetachedNotifier {
    async fn notify_end(&self, api: Arc<dyn WidgetApi>, conversation: ConversationId) {
        tokio::spawn(async move {
            if let Err(e) = api.end_conversation(&conversation).await {
                tracing::warn!("detached end call for {conversation} failed: {e}");
            }
        });
    }
}
