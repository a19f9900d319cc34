//! Stored document: generated object id plus a JSON field map.

use bson::oid::ObjectId;
use serde_json::{Map, Value};

/// Keys the store uses for its own bookkeeping. Never part of a document's fields.
pub const METADATA_KEYS: &[&str] = &["_id", "__v"];

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: ObjectId,
    pub fields: Map<String, Value>,
}

impl Document {
    /// New document with a freshly generated id.
    pub fn new(fields: Map<String, Value>) -> Self {
        Document {
            id: ObjectId::new(),
            fields,
        }
    }

    pub fn with_id(id: ObjectId, fields: Map<String, Value>) -> Self {
        Document { id, fields }
    }

    pub fn id_hex(&self) -> String {
        self.id.to_hex()
    }
}

/// Parse a path id. `None` for anything that is not 24 hex characters.
pub fn parse_id(s: &str) -> Option<ObjectId> {
    ObjectId::parse_str(s).ok()
}

/// Fields as stored: metadata keys removed.
pub fn strip_metadata(mut fields: Map<String, Value>) -> Map<String, Value> {
    for key in METADATA_KEYS {
        fields.remove(*key);
    }
    fields
}
