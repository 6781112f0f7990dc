//! Helpers for working with open-ended linked documents.
//!
//! Passport payloads come in too many shapes for static record types, so the
//! whole pipeline treats a document as a `serde_json::Value` and reaches into
//! it with these accessors.

use serde_json::Value;

/// The reserved key naming a node.
pub const ID_KEY: &str = "@id";
/// The reserved vocabulary-context key, never traversed.
pub const CONTEXT_KEY: &str = "@context";
/// The reserved type key.
pub const TYPE_KEY: &str = "@type";

/// A node's own identifier, if it has a string `@id`.
pub fn node_id(doc: &Value) -> Option<&str> {
    doc.get(ID_KEY).and_then(Value::as_str)
}

/// All type names on a node. `@type` may be a string or an array of strings.
pub fn node_types(doc: &Value) -> Vec<&str> {
    match doc.get(TYPE_KEY) {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// The first type name on a node, if any.
pub fn primary_type(doc: &Value) -> Option<&str> {
    node_types(doc).into_iter().next()
}

/// Whether an identifier is a blank node (`_:` prefix).
pub fn is_blank_node(id: &str) -> bool {
    id.starts_with("_:")
}

/// Resolve a dotted path (`a.b.c`) to a value. Returns `None` if any
/// segment is missing or null.
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}
