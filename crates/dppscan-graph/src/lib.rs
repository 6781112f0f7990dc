//! Graph expansion — bounded breadth-first traversal of linked documents.
//!
//! Given a parsed root document, follows every embedded identifier
//! reference through the resolver to build a bounded document graph. One
//! coordinator task owns all traversal state; fetches run in a bounded
//! worker pool and report back over a channel.

pub mod expand;
pub mod extract;
pub mod merge;
pub mod structure;
pub mod types;

pub use expand::expand;
pub use extract::{extract_links, ExtractOptions};
pub use merge::merge_resolved;
pub use structure::{build_graph_structure, GraphEdge, GraphNode, GraphStructure};
pub use types::*;
