//! Storage collaborator interface and its SQLite implementation.
//!
//! The store sees root records only. The `children` field travels as the
//! codec's encoded string and is never interpreted here.

use crate::db::Database;
use crate::types::{NewRoot, RootPatch, RootQuery, RootRecord};
use async_trait::async_trait;

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("root not found: {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence and listing of root records.
///
/// Every call is a suspension point. `persist_root` is a whole-field
/// overwrite with no version check: two writers that both started from the
/// same snapshot will silently lose one update.
#[async_trait]
pub trait RootStore: Send + Sync {
    async fn load_root(&self, root_id: &str) -> Result<Option<RootRecord>, StoreError>;

    async fn persist_root(&self, root_id: &str, patch: RootPatch) -> Result<(), StoreError>;

    async fn create_root(&self, fields: NewRoot) -> Result<RootRecord, StoreError>;

    async fn delete_root(&self, root_id: &str) -> Result<(), StoreError>;

    async fn list_roots(
        &self,
        owner_id: &str,
        query: &RootQuery,
    ) -> Result<Vec<RootRecord>, StoreError>;
}

/// [`RootStore`] backed by the local SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl RootStore for SqliteStore {
    async fn load_root(&self, root_id: &str) -> Result<Option<RootRecord>, StoreError> {
        self.db.get_root(root_id)
    }

    async fn persist_root(&self, root_id: &str, patch: RootPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.db.update_root(root_id, &patch)
    }

    async fn create_root(&self, fields: NewRoot) -> Result<RootRecord, StoreError> {
        self.db.create_root(fields)
    }

    async fn delete_root(&self, root_id: &str) -> Result<(), StoreError> {
        self.db.delete_root(root_id)
    }

    async fn list_roots(
        &self,
        owner_id: &str,
        query: &RootQuery,
    ) -> Result<Vec<RootRecord>, StoreError> {
        self.db.list_roots(owner_id, query)
    }
}
