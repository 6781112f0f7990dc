//! Node/edge structure for graph rendering.
//!
//! Flattens an expanded graph into the nodes-and-edges shape the
//! presentation layer draws, built on a petgraph `DiGraph`.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use serde_json::Value;

use dppscan_core::doc;

use crate::types::{LinkStatus, ResolvedGraph};

/// A renderable graph node.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub node_type: String,
    pub depth: usize,
    pub status: LinkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<usize>,
}

/// A renderable directed edge, labeled with the property that links the
/// two documents.
#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Nodes and edges for visualization.
#[derive(Debug, Clone, Serialize)]
pub struct GraphStructure {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Build the renderable structure for an expanded graph.
pub fn build_graph_structure(graph: &ResolvedGraph) -> GraphStructure {
    let mut dag: DiGraph<GraphNode, String> = DiGraph::new();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();

    let root = &graph.root;
    let root_id = doc::node_id(root).unwrap_or("root").to_string();
    let root_type = doc::primary_type(root).unwrap_or("Document").to_string();
    let root_node = GraphNode {
        id: root_id.clone(),
        label: node_label(root, &root_type, &root_id),
        node_type: root_type,
        depth: 0,
        status: LinkStatus::Resolved,
        size_bytes: None,
    };
    index.insert(root_id.clone(), dag.add_node(root_node));

    // Walk documents breadth-first, emitting an edge per referencing
    // property and descending into resolved link payloads.
    let mut work: Vec<(&Value, String)> = vec![(root, root_id)];
    while let Some((value, from_id)) = work.pop() {
        collect_edges(value, &from_id, graph, &mut dag, &mut index, &mut work);
    }

    let nodes = dag.node_weights().cloned().collect();
    let edges = dag
        .edge_indices()
        .filter_map(|e| {
            let (a, b) = dag.edge_endpoints(e)?;
            Some(GraphEdge {
                from: dag[a].id.clone(),
                to: dag[b].id.clone(),
                label: dag[e].clone(),
            })
        })
        .collect();

    GraphStructure { nodes, edges }
}

fn collect_edges<'a>(
    value: &'a Value,
    from_id: &str,
    graph: &'a ResolvedGraph,
    dag: &mut DiGraph<GraphNode, String>,
    index: &mut HashMap<String, NodeIndex>,
    work: &mut Vec<(&'a Value, String)>,
) {
    let Value::Object(map) = value else { return };

    for (key, child) in map {
        if key == doc::CONTEXT_KEY || key == doc::ID_KEY {
            continue;
        }
        match child {
            Value::Object(_) => {
                if let Some(to_id) = doc::node_id(child) {
                    add_edge(child, from_id, to_id, key, graph, dag, index, work);
                } else {
                    // No identifier of its own; references below it still
                    // belong to the enclosing document.
                    work.push((child, from_id.to_string()));
                }
            }
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(_) = item {
                        if let Some(to_id) = doc::node_id(item) {
                            add_edge(item, from_id, to_id, key, graph, dag, index, work);
                        } else {
                            work.push((item, from_id.to_string()));
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn add_edge<'a>(
    stub: &Value,
    from_id: &str,
    to_id: &str,
    key: &str,
    graph: &'a ResolvedGraph,
    dag: &mut DiGraph<GraphNode, String>,
    index: &mut HashMap<String, NodeIndex>,
    work: &mut Vec<(&'a Value, String)>,
) {
    let Some(&from_idx) = index.get(from_id) else {
        return;
    };

    let to_idx = match index.get(to_id) {
        Some(&idx) => idx,
        None => {
            let link = graph.links.get(to_id);
            let node_type = doc::primary_type(stub).unwrap_or("Unknown").to_string();
            let node = GraphNode {
                id: to_id.to_string(),
                label: node_label(stub, &node_type, to_id),
                depth: link.map(|l| l.depth).unwrap_or(0),
                status: link.map(|l| l.status).unwrap_or(LinkStatus::Pending),
                size_bytes: link.and_then(|l| l.size_bytes),
                node_type,
            };
            let idx = dag.add_node(node);
            index.insert(to_id.to_string(), idx);

            // Descend into the fetched payload exactly once per id.
            if let Some(data) = link.and_then(|l| l.data.as_ref()) {
                work.push((data, to_id.to_string()));
            }
            idx
        }
    };

    dag.add_edge(from_idx, to_idx, key.to_string());
}

fn node_label(value: &Value, node_type: &str, id: &str) -> String {
    if let Some(name) = value.get("name").and_then(Value::as_str) {
        return name.to_string();
    }
    if node_type != "Unknown" && node_type != "Document" {
        return node_type.to_string();
    }
    id.rsplit('/').next().unwrap_or(id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentReference, GraphStats};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn graph_with(root: Value, links: Vec<DocumentReference>) -> ResolvedGraph {
        let mut map = BTreeMap::new();
        for link in links {
            map.insert(link.id.clone(), link);
        }
        let mut graph = ResolvedGraph {
            root,
            links: map,
            stats: GraphStats::default(),
        };
        graph.compute_stats();
        graph
    }

    fn resolved(id: &str, depth: usize, data: Value) -> DocumentReference {
        DocumentReference {
            status: LinkStatus::Resolved,
            data: Some(data),
            ..DocumentReference::pending(id.to_string(), depth)
        }
    }

    #[test]
    fn test_root_and_children() {
        let root = json!({
            "@id": "urn:root",
            "@type": "Product",
            "name": "Widget",
            "battery": {"@id": "https://ex/b", "@type": "Battery"}
        });
        let graph = graph_with(
            root,
            vec![resolved("https://ex/b", 1, json!({"@id": "https://ex/b", "name": "Cell"}))],
        );

        let structure = build_graph_structure(&graph);
        assert_eq!(structure.nodes.len(), 2);
        assert_eq!(structure.nodes[0].id, "urn:root");
        assert_eq!(structure.nodes[0].label, "Widget");
        assert_eq!(structure.nodes[0].depth, 0);
        assert_eq!(structure.edges.len(), 1);
        assert_eq!(structure.edges[0].label, "battery");
    }

    #[test]
    fn test_descends_into_resolved_payloads() {
        let root = json!({
            "@id": "urn:root",
            "part": {"@id": "https://ex/a"}
        });
        let a_data = json!({
            "@id": "https://ex/a",
            "subpart": {"@id": "https://ex/b"}
        });
        let graph = graph_with(
            root,
            vec![
                resolved("https://ex/a", 1, a_data),
                DocumentReference::pending("https://ex/b".to_string(), 2),
            ],
        );

        let structure = build_graph_structure(&graph);
        assert_eq!(structure.nodes.len(), 3);
        let b = structure.nodes.iter().find(|n| n.id == "https://ex/b").unwrap();
        assert_eq!(b.status, LinkStatus::Pending);
        assert_eq!(b.depth, 2);
        assert!(structure
            .edges
            .iter()
            .any(|e| e.from == "https://ex/a" && e.to == "https://ex/b"));
    }

    #[test]
    fn test_cycle_does_not_loop() {
        let root = json!({"@id": "urn:root", "next": {"@id": "https://ex/a"}});
        let a_data = json!({"@id": "https://ex/a", "back": {"@id": "urn:root"}});
        let graph = graph_with(root, vec![resolved("https://ex/a", 1, a_data)]);

        let structure = build_graph_structure(&graph);
        assert_eq!(structure.nodes.len(), 2);
        assert_eq!(structure.edges.len(), 2);
    }

    #[test]
    fn test_references_under_anonymous_wrappers() {
        let root = json!({
            "@id": "urn:root",
            "wrapper": {"inner": {"@id": "https://ex/a"}}
        });
        let graph = graph_with(
            root,
            vec![DocumentReference::pending("https://ex/a".to_string(), 1)],
        );

        let structure = build_graph_structure(&graph);
        assert!(structure
            .edges
            .iter()
            .any(|e| e.from == "urn:root" && e.to == "https://ex/a" && e.label == "inner"));
    }
}
