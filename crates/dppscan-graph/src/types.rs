//! Expansion types.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

/// Resolution state of one discovered identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Pending,
    Resolved,
    Failed,
    Cancelled,
}

/// One discovered identifier and everything known about it.
///
/// Created the instant its id is first seen; `depth` is the depth of first
/// discovery and never changes afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReference {
    pub id: String,
    pub status: LinkStatus,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_outbound_links: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
}

impl DocumentReference {
    pub fn pending(id: String, depth: usize) -> Self {
        Self {
            id,
            status: LinkStatus::Pending,
            depth,
            data: None,
            error: None,
            size_bytes: None,
            has_outbound_links: None,
            fetched_at: None,
        }
    }
}

/// Aggregate counters over the final link map.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphStats {
    pub total: usize,
    pub resolved: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub pending: usize,
    pub max_depth_reached: usize,
    pub total_bytes: usize,
}

/// The bounded multi-document graph produced by one expansion call.
///
/// Owned by the caller; the engine keeps nothing across calls.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedGraph {
    pub root: Value,
    pub links: BTreeMap<String, DocumentReference>,
    pub stats: GraphStats,
}

impl ResolvedGraph {
    /// Recompute stats from the link map.
    pub fn compute_stats(&mut self) {
        let mut stats = GraphStats {
            total: self.links.len(),
            ..Default::default()
        };
        for link in self.links.values() {
            match link.status {
                LinkStatus::Resolved => stats.resolved += 1,
                LinkStatus::Failed => stats.failed += 1,
                LinkStatus::Cancelled => stats.cancelled += 1,
                LinkStatus::Pending => stats.pending += 1,
            }
            if link.status != LinkStatus::Pending {
                stats.max_depth_reached = stats.max_depth_reached.max(link.depth);
            }
            stats.total_bytes += link.size_bytes.unwrap_or(0);
        }
        self.stats = stats;
    }
}

/// Progress observer: `(processed_count, known_total_so_far, current_id)`.
pub type ProgressFn = dyn Fn(usize, usize, &str) + Send + Sync;

/// Expansion tuning knobs.
pub struct ExpandOptions {
    /// Deepest level to fetch; root's direct children are depth 1.
    pub max_depth: usize,
    /// Hard cap on discovered identifiers; consumed when an id is first
    /// recorded.
    pub max_links: usize,
    /// Timeout handed to the resolver for each fetch.
    pub per_request_timeout: Duration,
    /// Map `did:web` identifiers to HTTPS URLs before fetching.
    pub convert_did: bool,
    /// Bounded pool size for in-flight resolutions.
    pub concurrency: usize,
    /// Optional cap on concurrent fetches against one origin.
    pub per_origin_concurrency: Option<usize>,
    /// Optional minimum spacing between dispatches to one origin.
    pub origin_spacing: Option<Duration>,
    /// Optional wall-clock budget for the whole expansion; firing is
    /// equivalent to cancellation.
    pub global_timeout: Option<Duration>,
    /// User-Agent for outbound fetches.
    pub user_agent: String,
    /// Cancellation signal; send `true` to abort.
    pub cancel: Option<watch::Receiver<bool>>,
    /// Invoked after each node is processed. Observational only.
    pub on_progress: Option<Box<ProgressFn>>,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_links: 50,
            per_request_timeout: Duration::from_secs(10),
            convert_did: true,
            concurrency: 4,
            per_origin_concurrency: None,
            origin_spacing: None,
            global_timeout: None,
            user_agent: "DPP-Scanner-Agent/1.0".to_string(),
            cancel: None,
            on_progress: None,
        }
    }
}
