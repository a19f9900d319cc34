//! JSON:API response envelopes: `{ data: { type, id, attributes } }`.

use crate::document::{strip_metadata, Document};
use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::{Map, Value};

/// One resource object.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub attributes: Map<String, Value>,
}

#[derive(Serialize, Debug)]
pub struct DataBody<T> {
    pub data: T,
}

/// Format one stored document as a resource of type `kind`.
pub fn format_one(doc: Document, kind: &str) -> ResourceObject {
    ResourceObject {
        kind: kind.to_string(),
        id: doc.id_hex(),
        attributes: strip_metadata(doc.fields),
    }
}

/// Format documents in order.
pub fn format_many(docs: Vec<Document>, kind: &str) -> Vec<ResourceObject> {
    docs.into_iter().map(|doc| format_one(doc, kind)).collect()
}

/// Resource object as a plain JSON value, for nesting a populated reference.
pub fn to_value(resource: ResourceObject) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), Value::String(resource.kind));
    obj.insert("id".into(), Value::String(resource.id));
    obj.insert("attributes".into(), Value::Object(resource.attributes));
    Value::Object(obj)
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<DataBody<T>>) {
    (StatusCode::CREATED, Json(DataBody { data }))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<DataBody<T>>) {
    (StatusCode::OK, Json(DataBody { data }))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<DataBody<Vec<T>>>) {
    (StatusCode::OK, Json(DataBody { data }))
}
