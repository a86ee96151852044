//! `SQLite`-backed identity store.
//!
//! One row per tenant holding the visitor id and the optional active
//! conversation handle. This is the durable storage scope the widget owns
//! exclusively; no cross-process coordination is attempted.

use std::path::Path;
use std::sync::Arc;

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use super::ids::{ConversationId, TenantKey, VisitorId};
use super::{IdentityStore, StoreError, StoreFuture, StoreResult};

/// `SQLite` implementation of the identity store.
pub struct SqliteIdentityStore {
    conn: Arc<Connection>,
    table: String,
}

impl SqliteIdentityStore {
    /// Table name for identity slots.
    pub const DEFAULT_TABLE: &'static str = "widget_identity";

    /// Initialize the store and create the table if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>) -> StoreResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    tenant_key TEXT PRIMARY KEY,
                    visitor_id TEXT NOT NULL DEFAULT '',
                    conversation_id TEXT
                );"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }

    /// Open (or create) a store at the given database path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open_at(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())
            .await
            .map_err(StoreError::from)?;
        Self::new(Arc::new(conn)).await
    }
}

impl IdentityStore for SqliteIdentityStore {
    fn visitor_id(&self, tenant: &TenantKey) -> StoreFuture<'_, StoreResult<Option<VisitorId>>> {
        let tenant = tenant.as_str().to_owned();
        Box::pin(async move {
            let table = self.table.clone();
            let row: Option<String> = self
                .conn
                .call(move |conn| {
                    let row = conn
                        .query_row(
                            &format!("SELECT visitor_id FROM {table} WHERE tenant_key = ?1"),
                            [&tenant],
                            |row| row.get(0),
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;
            Ok(row
                .filter(|id| !id.is_empty())
                .map(VisitorId::from_stored))
        })
    }

    fn put_visitor_id(
        &self,
        tenant: &TenantKey,
        id: &VisitorId,
    ) -> StoreFuture<'_, StoreResult<()>> {
        let tenant = tenant.as_str().to_owned();
        let id = id.as_str().to_owned();
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (tenant_key, visitor_id) VALUES (?1, ?2)
                             ON CONFLICT(tenant_key) DO UPDATE SET visitor_id = excluded.visitor_id"
                        ),
                        rusqlite::params![tenant, id],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn conversation(
        &self,
        tenant: &TenantKey,
    ) -> StoreFuture<'_, StoreResult<Option<ConversationId>>> {
        let tenant = tenant.as_str().to_owned();
        Box::pin(async move {
            let table = self.table.clone();
            let row: Option<Option<String>> = self
                .conn
                .call(move |conn| {
                    let row = conn
                        .query_row(
                            &format!("SELECT conversation_id FROM {table} WHERE tenant_key = ?1"),
                            [&tenant],
                            |row| row.get(0),
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;
            Ok(row.flatten().map(ConversationId::from_server))
        })
    }

    fn set_conversation(
        &self,
        tenant: &TenantKey,
        id: &ConversationId,
    ) -> StoreFuture<'_, StoreResult<()>> {
        let tenant = tenant.as_str().to_owned();
        let id = id.as_str().to_owned();
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (tenant_key, conversation_id) VALUES (?1, ?2)
                             ON CONFLICT(tenant_key)
                             DO UPDATE SET conversation_id = excluded.conversation_id"
                        ),
                        rusqlite::params![tenant, id],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn clear_conversation(&self, tenant: &TenantKey) -> StoreFuture<'_, StoreResult<()>> {
        let tenant = tenant.as_str().to_owned();
        Box::pin(async move {
            let table = self.table.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "UPDATE {table} SET conversation_id = NULL WHERE tenant_key = ?1"
                        ),
                        rusqlite::params![tenant],
                    )?;
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::get_or_create_visitor_id;

    async fn open_test_store() -> SqliteIdentityStore {
        let conn = Connection::open_in_memory().await.unwrap();
        SqliteIdentityStore::new(Arc::new(conn)).await.unwrap()
    }

    #[tokio::test]
    async fn test_visitor_id_survives_rereads() {
        let store = open_test_store().await;
        let tenant = TenantKey::new("acme").unwrap();

        let first = get_or_create_visitor_id(&store, &tenant).await;
        let second = get_or_create_visitor_id(&store, &tenant).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_conversation_slot_roundtrip() {
        let store = open_test_store().await;
        let tenant = TenantKey::new("acme").unwrap();
        let handle = ConversationId::from_server("conv-42");

        assert!(store.conversation(&tenant).await.unwrap().is_none());
        store.set_conversation(&tenant, &handle).await.unwrap();
        assert_eq!(store.conversation(&tenant).await.unwrap(), Some(handle));
        store.clear_conversation(&tenant).await.unwrap();
        assert!(store.conversation(&tenant).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conversation_before_visitor_is_allowed() {
        // A restored handle can land before the visitor row exists.
        let store = open_test_store().await;
        let tenant = TenantKey::new("acme").unwrap();

        store
            .set_conversation(&tenant, &ConversationId::from_server("conv-1"))
            .await
            .unwrap();
        assert!(store.visitor_id(&tenant).await.unwrap().is_none());
    }
}
