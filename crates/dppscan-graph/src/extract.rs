//! Identifier reference extraction.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;

use dppscan_core::doc;

/// Extraction options.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Drop the document's own `@id` — it names the node, it is not a
    /// reference.
    pub exclude_root: bool,
    /// Keep blank-node identifiers (`_:` prefix).
    pub include_blank_nodes: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            exclude_root: true,
            include_blank_nodes: false,
        }
    }
}

/// Collect every identifier referenced by a document, in discovery order,
/// deduplicated.
///
/// Walks all nested objects and arrays with an explicit queue (documents can
/// be arbitrarily deep), skipping the `@context` subtree. Pure and
/// deterministic.
pub fn extract_links(document: &Value, options: &ExtractOptions) -> Vec<String> {
    let root_id = doc::node_id(document);

    let mut collected = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&Value> = VecDeque::new();
    queue.push_back(document);

    while let Some(node) = queue.pop_front() {
        match node {
            Value::Object(map) => {
                if let Some(id) = map.get(doc::ID_KEY).and_then(Value::as_str) {
                    let blank = doc::is_blank_node(id);
                    let is_root_id = options.exclude_root && root_id == Some(id);
                    if (!blank || options.include_blank_nodes) && !is_root_id && seen.insert(id) {
                        collected.push(id.to_string());
                    }
                }
                for (key, value) in map {
                    if key == doc::CONTEXT_KEY {
                        continue;
                    }
                    if value.is_object() || value.is_array() {
                        queue.push_back(value);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    if item.is_object() || item.is_array() {
                        queue.push_back(item);
                    }
                }
            }
            _ => {}
        }
    }

    collected
}
