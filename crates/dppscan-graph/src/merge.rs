//! Splice resolved payloads back into the root document.

use std::collections::HashSet;

use serde_json::Value;

use dppscan_core::doc;

use crate::types::{LinkStatus, ResolvedGraph};

/// Payloads fetched for an id can reference that id again; past this depth
/// the walk stops rather than chase pathological nesting.
const MAX_MERGE_DEPTH: usize = 64;

/// Produce a single document with every resolved reference expanded in
/// place.
///
/// Wherever an object carries an `@id` that resolved during expansion, the
/// fetched payload's fields are merged over the stub. Each id is expanded
/// only once — later occurrences stay stubs, which keeps reference cycles
/// finite.
pub fn merge_resolved(graph: &ResolvedGraph) -> Value {
    let mut expanded: HashSet<String> = HashSet::new();
    merge_value(graph.root.clone(), graph, &mut expanded, 0)
}

fn merge_value(
    value: Value,
    graph: &ResolvedGraph,
    expanded: &mut HashSet<String>,
    depth: usize,
) -> Value {
    if depth > MAX_MERGE_DEPTH {
        return value;
    }

    match value {
        Value::Object(mut map) => {
            if let Some(id) = map.get(doc::ID_KEY).and_then(Value::as_str).map(String::from) {
                if let Some(link) = graph.links.get(&id) {
                    if link.status == LinkStatus::Resolved && expanded.insert(id) {
                        if let Some(Value::Object(data)) = &link.data {
                            for (key, field) in data {
                                map.insert(key.clone(), field.clone());
                            }
                        }
                    }
                }
            }

            let merged = map
                .into_iter()
                .map(|(key, field)| {
                    if key == doc::CONTEXT_KEY {
                        (key, field)
                    } else {
                        (key, merge_value(field, graph, expanded, depth + 1))
                    }
                })
                .collect();
            Value::Object(merged)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| merge_value(item, graph, expanded, depth + 1))
                .collect(),
        ),
        other => other,
    }
}
