//! In-memory identity store.
//!
//! Fallback for environments without durable storage (storage disabled or
//! full) and the deterministic backend for tests. Identity held here lives
//! only as long as the process.

use dashmap::DashMap;

use super::ids::{ConversationId, TenantKey, VisitorId};
use super::{IdentityStore, StoreFuture, StoreResult};

/// Per-tenant slot pair.
#[derive(Clone, Default)]
struct Slots {
    visitor: Option<VisitorId>,
    conversation: Option<ConversationId>,
}

/// Thread-safe, non-durable identity store.
#[derive(Default)]
pub struct MemoryIdentityStore {
    slots: DashMap<String, Slots>,
}

impl MemoryIdentityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn visitor_id(&self, tenant: &TenantKey) -> StoreFuture<'_, StoreResult<Option<VisitorId>>> {
        let key = tenant.as_str().to_owned();
        Box::pin(async move {
            Ok(self
                .slots
                .get(&key)
                .and_then(|slots| slots.visitor.clone()))
        })
    }

    fn put_visitor_id(
        &self,
        tenant: &TenantKey,
        id: &VisitorId,
    ) -> StoreFuture<'_, StoreResult<()>> {
        let key = tenant.as_str().to_owned();
        let id = id.clone();
        Box::pin(async move {
            self.slots.entry(key).or_default().visitor = Some(id);
            Ok(())
        })
    }

    fn conversation(
        &self,
        tenant: &TenantKey,
    ) -> StoreFuture<'_, StoreResult<Option<ConversationId>>> {
        let key = tenant.as_str().to_owned();
        Box::pin(async move {
            Ok(self
                .slots
                .get(&key)
                .and_then(|slots| slots.conversation.clone()))
        })
    }

    fn set_conversation(
        &self,
        tenant: &TenantKey,
        id: &ConversationId,
    ) -> StoreFuture<'_, StoreResult<()>> {
        let key = tenant.as_str().to_owned();
        let id = id.clone();
        Box::pin(async move {
            self.slots.entry(key).or_default().conversation = Some(id);
            Ok(())
        })
    }

    fn clear_conversation(&self, tenant: &TenantKey) -> StoreFuture<'_, StoreResult<()>> {
        let key = tenant.as_str().to_owned();
        Box::pin(async move {
            if let Some(mut slots) = self.slots.get_mut(&key) {
                slots.conversation = None;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conversation_slot_roundtrip() {
        let store = MemoryIdentityStore::new();
        let tenant = TenantKey::new("acme").unwrap();
        let handle = ConversationId::from_server("conv-123");

        assert!(store.conversation(&tenant).await.unwrap().is_none());

        store.set_conversation(&tenant, &handle).await.unwrap();
        assert_eq!(store.conversation(&tenant).await.unwrap(), Some(handle));

        store.clear_conversation(&tenant).await.unwrap();
        assert!(store.conversation(&tenant).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clearing_conversation_keeps_visitor() {
        let store = MemoryIdentityStore::new();
        let tenant = TenantKey::new("acme").unwrap();
        let visitor = VisitorId::synthesize();

        store.put_visitor_id(&tenant, &visitor).await.unwrap();
        store
            .set_conversation(&tenant, &ConversationId::from_server("conv-1"))
            .await
            .unwrap();
        store.clear_conversation(&tenant).await.unwrap();

        assert_eq!(store.visitor_id(&tenant).await.unwrap(), Some(visitor));
    }
}
