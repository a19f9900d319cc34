//! Document persistence: one store handle shared by every router.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_collections, ensure_database_exists, PgDocumentStore};

use crate::document::Document;
use crate::error::AppError;
use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::{Map, Value};

/// How an update applies the supplied fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    /// Supplied fields overwrite their counterparts; all others are kept.
    Merge,
    /// Supplied fields become the whole document.
    Replace,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of a collection, ordered by id (creation order).
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, AppError>;

    async fn find_by_id(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, AppError>;

    /// Batch lookup for populating references. Missing ids are skipped.
    async fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> Result<Vec<Document>, AppError>;

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, AppError>;

    /// Apply `fields` to one document. Returns the updated document, `None` if the id is absent.
    async fn update(
        &self,
        collection: &str,
        id: &ObjectId,
        fields: Map<String, Value>,
        mode: UpdateMode,
    ) -> Result<Option<Document>, AppError>;

    /// Remove one document. Returns the removed document, `None` if the id is absent.
    async fn delete(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, AppError>;

    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError>;
}
