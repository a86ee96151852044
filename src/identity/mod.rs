//! Durable, tenant-scoped visitor identity for the widget runtime.
//!
//! One storage slot pair per tenant: the visitor id (created once, never
//! rotated) and the active conversation handle (present only while a
//! conversation is open). The browser-side widget keeps these in web
//! storage; this crate keeps them in `SQLite` with an in-memory fallback for
//! environments where durable storage is unavailable.

pub mod ids;
pub mod memory;
pub mod sqlite;

pub use ids::{ConversationId, TenantKey, TenantKeyError, VisitorId};
pub use memory::MemoryIdentityStore;
pub use sqlite::SqliteIdentityStore;

use std::future::Future;
use std::pin::Pin;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for identity store operations.
#[derive(Debug)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        Self(err.to_string())
    }
}

/// Result type for identity store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for tenant-scoped identity storage.
///
/// Implementations own exactly two slots per tenant: the visitor id and the
/// optional active conversation handle. No implementation performs network
/// calls.
pub trait IdentityStore: Send + Sync {
    /// Read the stored visitor id for a tenant, if any.
    fn visitor_id(&self, tenant: &TenantKey) -> StoreFuture<'_, StoreResult<Option<VisitorId>>>;

    /// Persist the visitor id for a tenant.
    fn put_visitor_id(
        &self,
        tenant: &TenantKey,
        id: &VisitorId,
    ) -> StoreFuture<'_, StoreResult<()>>;

    /// Read the active conversation handle for a tenant, if any.
    fn conversation(&self, tenant: &TenantKey)
    -> StoreFuture<'_, StoreResult<Option<ConversationId>>>;

    /// Persist the active conversation handle for a tenant.
    fn set_conversation(
        &self,
        tenant: &TenantKey,
        id: &ConversationId,
    ) -> StoreFuture<'_, StoreResult<()>>;

    /// Clear the active conversation handle for a tenant.
    fn clear_conversation(&self, tenant: &TenantKey) -> StoreFuture<'_, StoreResult<()>>;
}

/// Read the visitor id for a tenant, synthesizing and persisting a fresh one
/// if absent.
///
/// Storage failure must not take the widget down: a failed read or a failed
/// write degrades to an in-memory-only identity for this process life, with
/// a warning in the logs.
pub async fn get_or_create_visitor_id(store: &dyn IdentityStore, tenant: &TenantKey) -> VisitorId {
    match store.visitor_id(tenant).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            let id = VisitorId::synthesize();
            if let Err(e) = store.put_visitor_id(tenant, &id).await {
                tracing::warn!("identity write failed for tenant {tenant}: {e}");
            }
            id
        }
        Err(e) => {
            tracing::warn!("identity read failed for tenant {tenant}: {e}");
            VisitorId::synthesize()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = MemoryIdentityStore::new();
        let tenant = TenantKey::new("acme").unwrap();

        let first = get_or_create_visitor_id(&store, &tenant).await;
        let second = get_or_create_visitor_id(&store, &tenant).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_visitor_ids_are_tenant_scoped() {
        let store = MemoryIdentityStore::new();
        let acme = TenantKey::new("acme").unwrap();
        let globex = TenantKey::new("globex").unwrap();

        let a = get_or_create_visitor_id(&store, &acme).await;
        let b = get_or_create_visitor_id(&store, &globex).await;
        assert_ne!(a, b);
    }
}
