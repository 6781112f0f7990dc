//! The expansion engine — frontier, seen-set, bounded worker pool.
//!
//! The coordinator is the only writer of the frontier, seen-set, and result
//! map. Workers fetch one identifier each and report back over an mpsc
//! channel, so depth and budget bookkeeping stay race-free regardless of
//! arrival order.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use dppscan_core::{doc, Error, Result};
use dppscan_resolve::{is_http_url, Resolution, Resolver, ResolverOptions};

use crate::extract::{extract_links, ExtractOptions};
use crate::types::*;

/// Expand a parsed root document into a bounded multi-document graph.
///
/// Seeds the frontier from the root's references at depth 1, then follows
/// references breadth-first until the frontier empties, the link budget is
/// spent, or the call is cancelled. Per-link failures are captured on the
/// corresponding [`DocumentReference`] and never abort the traversal.
///
/// Errors only for malformed input (`max_links` or `concurrency` of zero).
pub async fn expand(root: &Value, mut options: ExpandOptions) -> Result<ResolvedGraph> {
    if options.max_links == 0 {
        return Err(Error::InvalidInput("max_links must be at least 1".to_string()));
    }
    if options.concurrency == 0 {
        return Err(Error::InvalidInput("concurrency must be at least 1".to_string()));
    }

    let resolver = Arc::new(Resolver::new(ResolverOptions {
        convert_did: options.convert_did,
        request_timeout: options.per_request_timeout,
        probe_timeout: options.per_request_timeout.min(Duration::from_secs(5)),
        user_agent: options.user_agent.clone(),
    })?);

    let mut links: BTreeMap<String, DocumentReference> = BTreeMap::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut frontier: VecDeque<(String, usize)> = VecDeque::new();
    let root_id = doc::node_id(root).map(str::to_string);

    // Seed from the root at depth 1. The budget is consumed the moment an
    // id is recorded; ids past the depth limit stay pending and are never
    // dispatched.
    for id in extract_links(root, &ExtractOptions::default()) {
        if links.len() >= options.max_links {
            break;
        }
        if root_id.as_deref() == Some(id.as_str()) {
            continue;
        }
        if !seen.insert(id.clone()) {
            continue;
        }
        links.insert(id.clone(), DocumentReference::pending(id.clone(), 1));
        if 1 <= options.max_depth {
            frontier.push_back((id, 1));
        }
    }

    let (tx, mut rx) = mpsc::channel::<WorkerResult>(options.concurrency);
    let mut limiter = OriginLimiter::new(options.per_origin_concurrency, options.origin_spacing);
    let mut handles: Vec<JoinHandle<()>> = Vec::new();
    let mut in_flight = 0usize;
    let mut processed = 0usize;
    let deadline = options.global_timeout.map(|t| Instant::now() + t);
    let mut cancel_rx = options.cancel.take();
    let mut cancelled = cancel_rx
        .as_ref()
        .map(|rx| *rx.borrow())
        .unwrap_or(false);

    while !cancelled {
        // Fill the pool with whatever the origin limiter allows.
        let mut next_ready: Option<Instant> = None;
        while in_flight < options.concurrency {
            match next_dispatchable(&mut frontier, &resolver, &limiter) {
                Dispatch::Item {
                    id,
                    depth,
                    url,
                    origin,
                } => {
                    if depth > options.max_depth {
                        // Guard; over-budget ids are filtered at enqueue.
                        if let Some(entry) = links.get_mut(&id) {
                            entry.status = LinkStatus::Failed;
                            entry.error = Some("depth budget exceeded".to_string());
                        }
                        processed += 1;
                        if let Some(cb) = &options.on_progress {
                            cb(processed, links.len(), &id);
                        }
                        continue;
                    }
                    if !is_http_url(&url) {
                        // Unsupported scheme: fail without any network call.
                        if let Some(entry) = links.get_mut(&id) {
                            entry.status = LinkStatus::Failed;
                            entry.error = Some(Error::Scheme(url).to_string());
                        }
                        processed += 1;
                        if let Some(cb) = &options.on_progress {
                            cb(processed, links.len(), &id);
                        }
                        continue;
                    }

                    limiter.note_dispatch(&origin, Instant::now());
                    in_flight += 1;
                    let resolver = resolver.clone();
                    let tx = tx.clone();
                    handles.push(tokio::spawn(async move {
                        let resolution = resolver.resolve(&id).await;
                        let _ = tx
                            .send(WorkerResult {
                                id,
                                depth,
                                origin,
                                resolution,
                            })
                            .await;
                    }));
                }
                Dispatch::WaitUntil(t) => {
                    next_ready = Some(t);
                    break;
                }
                Dispatch::Blocked | Dispatch::Empty => break,
            }
        }

        if in_flight == 0 && frontier.is_empty() {
            break;
        }

        let idle = async {
            match next_ready {
                Some(t) => tokio::time::sleep_until(t).await,
                None => std::future::pending().await,
            }
        };
        let global_deadline = async {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };
        let cancel_signal = async {
            match cancel_rx.as_mut() {
                Some(rx) => loop {
                    if *rx.borrow() {
                        return;
                    }
                    if rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                },
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            result = rx.recv() => {
                let Some(result) = result else { break };
                in_flight -= 1;
                limiter.note_complete(&result.origin);
                processed += 1;

                match result.resolution {
                    Ok(Resolution::Resolved(resolved)) => {
                        let children = child_links(&resolved.data, &result.id);
                        if let Some(entry) = links.get_mut(&result.id) {
                            entry.status = LinkStatus::Resolved;
                            entry.size_bytes = Some(resolved.size_bytes);
                            entry.has_outbound_links = Some(!children.is_empty());
                            entry.fetched_at = Some(chrono::Utc::now().to_rfc3339());
                            entry.data = Some(resolved.data);
                        }

                        let child_depth = result.depth + 1;
                        for child in children {
                            if links.len() >= options.max_links {
                                break;
                            }
                            if !seen.insert(child.clone()) {
                                continue;
                            }
                            links.insert(
                                child.clone(),
                                DocumentReference::pending(child.clone(), child_depth),
                            );
                            if child_depth <= options.max_depth {
                                frontier.push_back((child, child_depth));
                            }
                        }
                    }
                    Ok(resolution @ Resolution::Exhausted { .. }) => {
                        if let Some(entry) = links.get_mut(&result.id) {
                            entry.status = LinkStatus::Failed;
                            entry.error = Some(resolution.failure_summary());
                        }
                    }
                    Err(e) => {
                        if let Some(entry) = links.get_mut(&result.id) {
                            entry.status = LinkStatus::Failed;
                            entry.error = Some(e.to_string());
                        }
                    }
                }

                if let Some(cb) = &options.on_progress {
                    cb(processed, links.len(), &result.id);
                }
            }
            _ = idle => {}
            _ = global_deadline => { cancelled = true; }
            _ = cancel_signal => { cancelled = true; }
        }
    }

    if cancelled {
        for handle in &handles {
            handle.abort();
        }
        for entry in links.values_mut() {
            if entry.status == LinkStatus::Pending {
                entry.status = LinkStatus::Cancelled;
                entry.error = Some("cancelled before fetch completed".to_string());
            }
        }
    }

    let mut graph = ResolvedGraph {
        root: root.clone(),
        links,
        stats: GraphStats::default(),
    };
    graph.compute_stats();

    debug!(
        "expansion complete: {} links ({} resolved, {} failed, {} cancelled, {} pending)",
        graph.stats.total,
        graph.stats.resolved,
        graph.stats.failed,
        graph.stats.cancelled,
        graph.stats.pending
    );

    Ok(graph)
}

/// References inside a fetched document, minus the document itself.
fn child_links(data: &Value, own_id: &str) -> Vec<String> {
    extract_links(data, &ExtractOptions::default())
        .into_iter()
        .filter(|child| child != own_id)
        .collect()
}

struct WorkerResult {
    id: String,
    depth: usize,
    origin: String,
    resolution: Result<Resolution>,
}

enum Dispatch {
    Item {
        id: String,
        depth: usize,
        url: String,
        origin: String,
    },
    WaitUntil(Instant),
    Blocked,
    Empty,
}

/// Pull the first frontier entry whose origin is ready.
fn next_dispatchable(
    frontier: &mut VecDeque<(String, usize)>,
    resolver: &Resolver,
    limiter: &OriginLimiter,
) -> Dispatch {
    if frontier.is_empty() {
        return Dispatch::Empty;
    }

    let now = Instant::now();
    let mut earliest: Option<Instant> = None;
    let mut blocked = false;

    for idx in 0..frontier.len() {
        let url = resolver.normalize(&frontier[idx].0);
        let origin = origin_key(&url);

        // Non-HTTP(S) ids are handled inline by the coordinator and never
        // consume an origin slot.
        let readiness = if is_http_url(&url) {
            limiter.readiness(&origin, now)
        } else {
            Readiness::Ready
        };

        match readiness {
            Readiness::Ready => {
                if let Some((id, depth)) = frontier.remove(idx) {
                    return Dispatch::Item {
                        id,
                        depth,
                        url,
                        origin,
                    };
                }
            }
            Readiness::Busy => blocked = true,
            Readiness::NotBefore(t) => {
                earliest = Some(earliest.map_or(t, |e| e.min(t)));
            }
        }
    }

    if let Some(t) = earliest {
        Dispatch::WaitUntil(t)
    } else if blocked {
        Dispatch::Blocked
    } else {
        Dispatch::Empty
    }
}

fn origin_key(url: &str) -> String {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    rest.split('/').next().unwrap_or(rest).to_string()
}

enum Readiness {
    Ready,
    Busy,
    NotBefore(Instant),
}

/// Per-origin dispatch control: optional in-flight cap and minimum spacing.
struct OriginLimiter {
    max_in_flight: Option<usize>,
    spacing: Option<Duration>,
    in_flight: HashMap<String, usize>,
    next_allowed: HashMap<String, Instant>,
}

impl OriginLimiter {
    fn new(max_in_flight: Option<usize>, spacing: Option<Duration>) -> Self {
        Self {
            max_in_flight,
            spacing,
            in_flight: HashMap::new(),
            next_allowed: HashMap::new(),
        }
    }

    fn readiness(&self, origin: &str, now: Instant) -> Readiness {
        if let Some(cap) = self.max_in_flight {
            if self.in_flight.get(origin).copied().unwrap_or(0) >= cap {
                return Readiness::Busy;
            }
        }
        if let Some(t) = self.next_allowed.get(origin) {
            if *t > now {
                return Readiness::NotBefore(*t);
            }
        }
        Readiness::Ready
    }

    fn note_dispatch(&mut self, origin: &str, now: Instant) {
        *self.in_flight.entry(origin.to_string()).or_insert(0) += 1;
        if let Some(spacing) = self.spacing {
            self.next_allowed.insert(origin.to_string(), now + spacing);
        }
    }

    fn note_complete(&mut self, origin: &str) {
        if let Some(n) = self.in_flight.get_mut(origin) {
            *n = n.saturating_sub(1);
        }
    }
}
