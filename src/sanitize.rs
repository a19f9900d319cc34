//! Request body sanitizer.
//!
//! Removes client-supplied ids, operator-like keys (`$where`, `a.b`), and HTML
//! markup from string values before a body reaches the schema layer.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Top-level keys a client may never set.
const RESERVED_KEYS: &[&str] = &["id", "_id"];

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?(</script\s*>|$)").expect("static regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)</?[A-Za-z!][^>]*>").expect("static regex"))
}

/// Sanitize a request body object.
pub fn sanitize_body(body: Map<String, Value>) -> Map<String, Value> {
    let mut out = sanitize_object(body);
    for key in RESERVED_KEYS {
        out.remove(*key);
    }
    out
}

fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

fn sanitize_object(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter()
        .filter(|(k, _)| !is_operator_key(k))
        .map(|(k, v)| (k, sanitize_value(v)))
        .collect()
}

fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(strip_tags(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(obj) => Value::Object(sanitize_object(obj)),
        other => other,
    }
}

/// Remove markup, dropping `<script>` contents entirely.
pub fn strip_tags(s: &str) -> String {
    let without_scripts = script_re().replace_all(s, "");
    tag_re().replace_all(&without_scripts, "").into_owned()
}
