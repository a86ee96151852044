//! Conversation lifecycle: when a conversation starts, and the at-most-once
//! guard around the end-of-conversation signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of the current conversation, as seen by the hosting shell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LifecycleState {
    /// No message sent yet; a fresh welcome message is showing.
    NotStarted,
    /// At least one message sent (or a handle restored from storage).
    Active,
    /// An end was requested; the end call is being dispatched.
    Ending,
    /// The end call was dispatched (fire-and-forget). Terminal until a new
    /// conversation is started.
    Ended,
}

/// What triggered the end of a conversation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndReason {
    /// The visitor clicked "End Chat".
    UserAction,
    /// The page is being navigated away from or the tab closed; nothing may
    /// block, so the end call goes through the detached transport.
    PageUnload,
    /// The widget component is being torn down without a page unload.
    Teardown,
}

/// One-shot claim token guarding the end call.
///
/// Both the unload handler and the unmount cleanup independently try to end
/// the conversation; whichever claims the guard first dispatches, the other
/// becomes a no-op. Cloned guards share the claim.
#[derive(Clone, Debug, Default)]
pub struct EndGuard {
    claimed: Arc<AtomicBool>,
}

impl EndGuard {
    /// Create an unclaimed guard for a fresh conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard. Returns `true` exactly once per guard.
    #[must_use]
    pub fn try_claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::SeqCst)
    }

    /// Whether the guard has been claimed.
    #[must_use]
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}
