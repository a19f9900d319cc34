//! In-process store. Same semantics as the Postgres store; used by tests and `REGISTRAR_STORE=memory`.

use crate::document::Document;
use crate::error::AppError;
use crate::store::{DocumentStore, UpdateMode};
use async_trait::async_trait;
use bson::oid::ObjectId;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Collection name -> (hex id -> fields). Hex ids sort in creation order.
type Collections = HashMap<String, BTreeMap<String, Map<String, Value>>>;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

fn to_document(hex: &str, fields: &Map<String, Value>) -> Result<Document, AppError> {
    let id = ObjectId::parse_str(hex).map_err(|e| AppError::Store(format!("corrupt id {}: {}", hex, e)))?;
    Ok(Document::with_id(id, fields.clone()))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let guard = self.collections.read().await;
        match guard.get(collection) {
            Some(docs) => docs.iter().map(|(id, fields)| to_document(id, fields)).collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn find_by_id(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, AppError> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(&id.to_hex()))
            .map(|fields| Document::with_id(*id, fields.clone())))
    }

    async fn find_by_ids(&self, collection: &str, ids: &[ObjectId]) -> Result<Vec<Document>, AppError> {
        let guard = self.collections.read().await;
        let Some(docs) = guard.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| docs.get(&id.to_hex()).map(|fields| Document::with_id(*id, fields.clone())))
            .collect())
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, AppError> {
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection.to_string()).or_default();
        let key = doc.id_hex();
        if docs.contains_key(&key) {
            return Err(AppError::Store(format!("duplicate id {}", key)));
        }
        docs.insert(key, doc.fields.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &ObjectId,
        fields: Map<String, Value>,
        mode: UpdateMode,
    ) -> Result<Option<Document>, AppError> {
        let mut guard = self.collections.write().await;
        let Some(existing) = guard.get_mut(collection).and_then(|docs| docs.get_mut(&id.to_hex())) else {
            return Ok(None);
        };
        match mode {
            UpdateMode::Merge => existing.extend(fields),
            UpdateMode::Replace => *existing = fields,
        }
        Ok(Some(Document::with_id(*id, existing.clone())))
    }

    async fn delete(&self, collection: &str, id: &ObjectId) -> Result<Option<Document>, AppError> {
        let mut guard = self.collections.write().await;
        Ok(guard
            .get_mut(collection)
            .and_then(|docs| docs.remove(&id.to_hex()))
            .map(|fields| Document::with_id(*id, fields)))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
