//! Resolver types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fetch strategies, tried in order until one yields parsed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Identifier scheme check, performed before any network call.
    SchemeCheck,
    /// GET with `Accept: application/ld+json`.
    LinkedDataAccept,
    /// GET with `Accept: application/json`.
    JsonAccept,
    /// Probe a fixed list of well-known discovery paths on the origin.
    WellKnownProbe,
    /// Retry with a `.json` suffix appended.
    JsonSuffix,
    /// Parse markup and pull out embedded structured data.
    HtmlEmbedded,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SchemeCheck => "scheme_check",
            Strategy::LinkedDataAccept => "linked_data_accept",
            Strategy::JsonAccept => "json_accept",
            Strategy::WellKnownProbe => "well_known_probe",
            Strategy::JsonSuffix => "json_suffix",
            Strategy::HtmlEmbedded => "html_embedded",
        }
    }
}

/// Record of one strategy's outcome against one target URL.
#[derive(Debug, Clone, Serialize)]
pub struct FetchAttempt {
    pub strategy: Strategy,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A successfully negotiated document.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDocument {
    pub data: Value,
    pub strategy: Strategy,
    /// The URL that actually produced the data (may differ from the
    /// identifier for probe and suffix strategies).
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size_bytes: usize,
}

/// Outcome of a resolve call: a document, or the full attempt trail.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(ResolvedDocument),
    Exhausted { attempts: Vec<FetchAttempt> },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn document(&self) -> Option<&ResolvedDocument> {
        match self {
            Resolution::Resolved(doc) => Some(doc),
            Resolution::Exhausted { .. } => None,
        }
    }

    /// One-line summary of why resolution failed, for per-link diagnostics.
    pub fn failure_summary(&self) -> String {
        match self {
            Resolution::Resolved(_) => String::new(),
            Resolution::Exhausted { attempts } => {
                let parts: Vec<String> = attempts
                    .iter()
                    .map(|a| {
                        let detail = match (&a.error, a.status) {
                            (Some(e), _) => e.clone(),
                            (None, Some(s)) => format!("HTTP {}", s),
                            (None, None) => "no response".to_string(),
                        };
                        format!("{}: {}", a.strategy.name(), detail)
                    })
                    .collect();
                parts.join("; ")
            }
        }
    }
}

/// One entry in a full diagnostic run (all strategies, no short-circuit).
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticAttempt {
    pub strategy: Strategy,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report from [`crate::Resolver::diagnose`].
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub identifier: String,
    pub url: String,
    pub attempts: Vec<DiagnosticAttempt>,
    pub successful: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_strategy: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_url: Option<String>,
}

/// Result of probing one well-known path on an origin.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub path: String,
    pub url: String,
    pub status: Option<u16>,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Resolver tuning knobs.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Map `did:web` identifiers to HTTPS URLs before fetching.
    pub convert_did: bool,
    /// Timeout for the primary accept-header strategies.
    pub request_timeout: Duration,
    /// Timeout for well-known probes and suffix retries.
    pub probe_timeout: Duration,
    /// User-Agent header on all outbound requests.
    pub user_agent: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            convert_did: true,
            request_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            user_agent: "DPP-Scanner-Agent/1.0".to_string(),
        }
    }
}
