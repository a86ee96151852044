//! Identifier types for widget identity and conversation scoping.
//!
//! This module is intentionally **type-heavy** and **logic-light**: strongly
//! typed newtypes so a tenant key, a visitor id, and a conversation handle
//! can never be swapped at a call site.
//!
//! Ownership rules enforced by construction:
//! - [`VisitorId`] is synthesized on the client, once per (browser, tenant)
//!   scope, and never rotated afterwards.
//! - [`ConversationId`] is minted by the server only; this crate can wrap an
//!   existing handle but offers no generator for one.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Tenant keys ==========================================================

/// Errors returned when parsing/validating a [`TenantKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantKeyError {
    /// Empty (or whitespace-only) key.
    Empty,
    /// Exceeds the maximum accepted length.
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        got: usize,
    },
    /// Contains a disallowed character.
    InvalidChar {
        /// The invalid character.
        ch: char,
        /// The index where it was found.
        index: usize,
    },
}

impl fmt::Display for TenantKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "tenant key must not be empty"),
            Self::TooLong { max, got } => write!(f, "tenant key too long: got {got}, max {max}"),
            Self::InvalidChar { ch, index } => {
                write!(
                    f,
                    "tenant key contains invalid character {ch:?} at index {index}"
                )
            }
        }
    }
}

impl std::error::Error for TenantKeyError {}

/// Identifier of a configured chat agent (the unit of isolation for identity
/// and conversation scoping).
///
/// Tenant keys travel in URL path segments and in storage keys, so the
/// accepted alphabet is deliberately conservative.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct TenantKey(String);

impl TenantKey {
    /// Hard ceiling to prevent pathological payloads.
    pub const MAX_LEN: usize = 128;

    /// Build a validated `TenantKey`.
    ///
    /// Rules:
    /// - Non-empty after trimming.
    /// - Max length limited.
    /// - Conservative ASCII set: `[A-Za-z0-9._-]`.
    ///
    /// # Errors
    /// Returns `TenantKeyError` if the input is empty, too long, or contains
    /// invalid characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TenantKeyError> {
        let s = raw.as_ref().trim();

        if s.is_empty() {
            return Err(TenantKeyError::Empty);
        }
        if s.len() > Self::MAX_LEN {
            return Err(TenantKeyError::TooLong {
                max: Self::MAX_LEN,
                got: s.len(),
            });
        }

        for (i, ch) in s.chars().enumerate() {
            let ok = ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-');
            if !ok {
                return Err(TenantKeyError::InvalidChar { ch, index: i });
            }
        }

        Ok(Self(s.to_owned()))
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into `String`.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantKey {
    type Err = TenantKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TenantKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<String> for TenantKey {
    type Error = TenantKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ===== Visitor ids ==========================================================

/// A client-generated, durably stored identifier representing one browser's
/// relationship to one tenant.
///
/// Collision-resistant enough for practical purposes (UUIDv4 under the
/// hood), not cryptographically sensitive. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct VisitorId(String);

impl VisitorId {
    /// Synthesize a fresh visitor id.
    #[inline]
    #[must_use]
    pub fn synthesize() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a previously persisted visitor id.
    #[inline]
    #[must_use]
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into `String`.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for VisitorId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ===== Conversation handles =================================================

/// A server-minted identifier grouping a sequence of messages into one
/// logical conversation.
///
/// The client only ever wraps a handle the server returned; there is
/// deliberately no way to generate one locally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap a handle received from the server (or restored from storage).
    #[inline]
    #[must_use]
    pub fn from_server(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into `String`.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_key_accepts_conservative_ascii() {
        let key = TenantKey::new("acme-support_v2.bot").unwrap();
        assert_eq!(key.as_str(), "acme-support_v2.bot");
    }

    #[test]
    fn test_tenant_key_rejects_empty_and_invalid() {
        assert_eq!(TenantKey::new("   "), Err(TenantKeyError::Empty));
        assert!(matches!(
            TenantKey::new("acme/evil"),
            Err(TenantKeyError::InvalidChar { ch: '/', index: 4 })
        ));
    }

    #[test]
    fn test_tenant_key_rejects_too_long() {
        let raw = "a".repeat(TenantKey::MAX_LEN + 1);
        assert!(matches!(
            TenantKey::new(raw),
            Err(TenantKeyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_visitor_ids_are_unique() {
        let a = VisitorId::synthesize();
        let b = VisitorId::synthesize();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }
}
