//! Document validation from schema rules: cast, trim, required, length.

use crate::error::AppError;
use crate::schema::{EntitySchema, FieldRule, FieldType};
use bson::oid::ObjectId;
use serde_json::{Map, Value};

/// Which rules apply to a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    /// Create and replace: the body is the whole document, required fields must be present.
    Full,
    /// Merge: only supplied fields are checked, but a required field may not be cleared.
    Partial,
}

pub struct DocumentValidator;

impl DocumentValidator {
    /// Cast and validate a sanitized body. Returns the fields to store.
    pub fn prepare(
        schema: &EntitySchema,
        body: Map<String, Value>,
        mode: ValidationMode,
    ) -> Result<Map<String, Value>, AppError> {
        let mut out = Map::new();
        for (key, value) in body {
            match schema.field(&key) {
                Some(rule) => {
                    let value = cast_field(schema, rule, value)?;
                    out.insert(key, value);
                }
                None if schema.strict => {}
                None => {
                    out.insert(key, value);
                }
            }
        }
        for rule in &schema.fields {
            let val = out.get(rule.name);
            if mode == ValidationMode::Partial && val.is_none() {
                continue;
            }
            validate_field(schema, rule, val)?;
        }
        Ok(out)
    }
}

fn cast_failed(schema: &EntitySchema, rule: &FieldRule, value: &Value) -> AppError {
    let expected = match rule.field_type {
        FieldType::String => "string",
        FieldType::Reference { .. } => "object id",
    };
    AppError::Validation(format!(
        "{} validation failed: cast to {} failed for value {} at path {}",
        schema.kind, expected, value, rule.name
    ))
}

fn cast_field(schema: &EntitySchema, rule: &FieldRule, value: Value) -> Result<Value, AppError> {
    match (&rule.field_type, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldType::String, Value::String(s)) => Ok(Value::String(if rule.trim { s.trim().to_string() } else { s })),
        (FieldType::String, v @ (Value::Number(_) | Value::Bool(_))) => {
            let s = v.to_string();
            Ok(Value::String(if rule.trim { s.trim().to_string() } else { s }))
        }
        (FieldType::Reference { .. }, Value::String(s)) => match ObjectId::parse_str(s.trim()) {
            Ok(oid) => Ok(Value::String(oid.to_hex())),
            Err(_) => Err(cast_failed(schema, rule, &Value::String(s))),
        },
        (_, v) => Err(cast_failed(schema, rule, &v)),
    }
}

fn validate_field(schema: &EntitySchema, rule: &FieldRule, val: Option<&Value>) -> Result<(), AppError> {
    let missing = match val {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if missing {
        if rule.required {
            return Err(AppError::Validation(format!(
                "{} validation failed: {} is required",
                schema.kind, rule.name
            )));
        }
        return Ok(());
    }
    if let (Some(max), Some(s)) = (rule.max_length, val.and_then(Value::as_str)) {
        if s.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} validation failed: {} must be at most {} characters",
                schema.kind, rule.name, max
            )));
        }
    }
    Ok(())
}
