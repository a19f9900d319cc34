//! Generic CRUD over any entity schema.

use crate::document::{parse_id, Document};
use crate::error::AppError;
use crate::response::{format_many, format_one, to_value, ResourceObject};
use crate::schema::EntitySchema;
use crate::service::{DocumentValidator, ValidationMode};
use crate::store::{DocumentStore, UpdateMode};
use bson::oid::ObjectId;
use serde_json::{Map, Value};
use std::collections::HashMap;

pub struct CrudService;

impl CrudService {
    /// All documents, references populated.
    pub async fn list(store: &dyn DocumentStore, schema: &EntitySchema) -> Result<Vec<ResourceObject>, AppError> {
        let docs = store.find_all(schema.collection).await?;
        let docs = populate(store, schema, docs).await?;
        Ok(format_many(docs, schema.collection))
    }

    /// Validate and insert a sanitized body.
    pub async fn create(
        store: &dyn DocumentStore,
        schema: &EntitySchema,
        body: Map<String, Value>,
    ) -> Result<ResourceObject, AppError> {
        let fields = DocumentValidator::prepare(schema, body, ValidationMode::Full)?;
        let doc = store.insert(schema.collection, Document::new(fields)).await?;
        Ok(format_one(doc, schema.collection))
    }

    /// One document, references populated.
    pub async fn read(store: &dyn DocumentStore, schema: &EntitySchema, id: &str) -> Result<ResourceObject, AppError> {
        let oid = require_id(schema, id)?;
        let doc = store
            .find_by_id(schema.collection, &oid)
            .await?
            .ok_or_else(|| not_found(schema, id))?;
        let mut docs = populate(store, schema, vec![doc]).await?;
        let doc = docs.pop().ok_or_else(|| not_found(schema, id))?;
        Ok(format_one(doc, schema.collection))
    }

    /// Merge (PATCH) or replace (PUT) one document. Validation runs before the id is looked up.
    pub async fn update(
        store: &dyn DocumentStore,
        schema: &EntitySchema,
        id: &str,
        body: Map<String, Value>,
        mode: UpdateMode,
    ) -> Result<ResourceObject, AppError> {
        let validation = match mode {
            UpdateMode::Merge => ValidationMode::Partial,
            UpdateMode::Replace => ValidationMode::Full,
        };
        let fields = DocumentValidator::prepare(schema, body, validation)?;
        let oid = require_id(schema, id)?;
        let doc = store
            .update(schema.collection, &oid, fields, mode)
            .await?
            .ok_or_else(|| not_found(schema, id))?;
        Ok(format_one(doc, schema.collection))
    }

    /// Remove one document and return it.
    pub async fn delete(store: &dyn DocumentStore, schema: &EntitySchema, id: &str) -> Result<ResourceObject, AppError> {
        let oid = require_id(schema, id)?;
        let doc = store
            .delete(schema.collection, &oid)
            .await?
            .ok_or_else(|| not_found(schema, id))?;
        Ok(format_one(doc, schema.collection))
    }
}

fn not_found(schema: &EntitySchema, id: &str) -> AppError {
    AppError::NotFound {
        kind: schema.kind,
        id: id.to_string(),
    }
}

/// Malformed ids cannot name a document.
fn require_id(schema: &EntitySchema, id: &str) -> Result<ObjectId, AppError> {
    parse_id(id).ok_or_else(|| not_found(schema, id))
}

/// Replace each reference id with the referenced resource, or `null` when it no longer exists.
/// One batched lookup per reference field.
async fn populate(
    store: &dyn DocumentStore,
    schema: &EntitySchema,
    mut docs: Vec<Document>,
) -> Result<Vec<Document>, AppError> {
    for (field, collection) in schema.references() {
        let mut ids: Vec<ObjectId> = docs
            .iter()
            .filter_map(|d| d.fields.get(field).and_then(Value::as_str).and_then(parse_id))
            .collect();
        ids.sort_by_key(|id| id.bytes());
        ids.dedup();
        let found: HashMap<String, Document> = store
            .find_by_ids(collection, &ids)
            .await?
            .into_iter()
            .map(|d| (d.id_hex(), d))
            .collect();
        for doc in &mut docs {
            let Some(slot) = doc.fields.get_mut(field) else {
                continue;
            };
            if slot.is_null() {
                continue;
            }
            *slot = slot
                .as_str()
                .and_then(|id| found.get(id))
                .map(|related| to_value(format_one(related.clone(), collection)))
                .unwrap_or(Value::Null);
        }
    }
    Ok(docs)
}
