//! Ordered fetch strategies and the negotiation loop.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use dppscan_core::{did, Error, Result};

use crate::html;
use crate::types::*;

/// Origin-relative discovery paths probed by [`Strategy::WellKnownProbe`].
pub const WELL_KNOWN_PATHS: &[&str] = &[
    "/.well-known/did.json",
    "/.well-known/did-configuration.json",
    "/.well-known/dpp-configuration",
    "/.well-known/dppdata",
    "/.well-known/gs1resolver",
    "/api/dpp",
    "/api/v1/dpp",
    "/api/passports",
    "/dpp/api",
];

const ACCEPT_LD_JSON: &str = "application/ld+json";
const ACCEPT_JSON: &str = "application/json";
const ACCEPT_ANY_JSON: &str = "application/ld+json, application/json, */*";
const ACCEPT_HTML: &str = "text/html, application/xhtml+xml;q=0.9, */*;q=0.8";

const NEGOTIATION_ORDER: [Strategy; 5] = [
    Strategy::LinkedDataAccept,
    Strategy::JsonAccept,
    Strategy::WellKnownProbe,
    Strategy::JsonSuffix,
    Strategy::HtmlEmbedded,
];

/// Multi-strategy content negotiator.
///
/// `resolve` never errors for network or parse failures — those are captured
/// per attempt. The only hard error is malformed input (empty identifier).
pub struct Resolver {
    client: Client,
    options: ResolverOptions,
}

/// Outcome of running one strategy: failed attempts plus at most one document.
struct StrategyRun {
    attempts: Vec<FetchAttempt>,
    resolved: Option<ResolvedDocument>,
}

impl StrategyRun {
    fn skipped() -> Self {
        Self {
            attempts: Vec::new(),
            resolved: None,
        }
    }
}

/// Raw result of one HTTP GET, with any status code tolerated.
struct RawFetch {
    status: Option<u16>,
    content_type: Option<String>,
    body: Option<String>,
    error: Option<String>,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Map an identifier to the URL the strategies will fetch.
    pub fn normalize(&self, id: &str) -> String {
        if self.options.convert_did && id.starts_with("did:web:") {
            did::to_http_url(id)
        } else {
            id.to_string()
        }
    }

    /// Resolve one identifier, trying strategies in order until one yields
    /// non-empty parsed data. Returns the full attempt trail on exhaustion.
    ///
    /// Errors only for an empty identifier. Non-HTTP(S) identifiers come
    /// back as `Exhausted` with a single scheme attempt and no network call.
    pub async fn resolve(&self, id: &str) -> Result<Resolution> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("empty identifier".to_string()));
        }

        let url = self.normalize(id);
        if !is_http_url(&url) {
            return Ok(Resolution::Exhausted {
                attempts: vec![scheme_attempt(&url)],
            });
        }

        let mut attempts = Vec::new();
        for strategy in NEGOTIATION_ORDER {
            let run = self.run_strategy(strategy, &url).await;
            attempts.extend(run.attempts);
            if let Some(doc) = run.resolved {
                debug!(
                    "resolved {} via {} ({} bytes)",
                    id,
                    doc.strategy.name(),
                    doc.size_bytes
                );
                return Ok(Resolution::Resolved(doc));
            }
        }

        debug!("exhausted all strategies for {} ({} attempts)", id, attempts.len());
        Ok(Resolution::Exhausted { attempts })
    }

    /// Run every strategy without short-circuiting and report each outcome.
    /// This is the debugging surface behind the `/api/resolve` endpoint.
    pub async fn diagnose(&self, id: &str) -> Result<DiagnosticReport> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidInput("empty identifier".to_string()));
        }

        let url = self.normalize(id);
        if !is_http_url(&url) {
            let attempt = scheme_attempt(&url);
            return Ok(DiagnosticReport {
                identifier: id.to_string(),
                url: url.clone(),
                attempts: vec![DiagnosticAttempt {
                    strategy: attempt.strategy,
                    url: attempt.url,
                    status: None,
                    content_type: None,
                    data: None,
                    error: attempt.error,
                }],
                successful: 0,
                best_strategy: None,
                best_url: None,
            });
        }

        let mut attempts = Vec::new();
        for strategy in NEGOTIATION_ORDER {
            let run = self.run_strategy(strategy, &url).await;
            for a in run.attempts {
                attempts.push(DiagnosticAttempt {
                    strategy: a.strategy,
                    url: a.url,
                    status: a.status,
                    content_type: a.content_type,
                    data: None,
                    error: a.error,
                });
            }
            if let Some(doc) = run.resolved {
                attempts.push(DiagnosticAttempt {
                    strategy: doc.strategy,
                    url: doc.url,
                    status: Some(200),
                    content_type: doc.content_type,
                    data: Some(doc.data),
                    error: None,
                });
            }
        }

        let successful = attempts.iter().filter(|a| a.data.is_some()).count();
        let best = attempts.iter().find(|a| a.data.is_some());

        Ok(DiagnosticReport {
            identifier: id.to_string(),
            url,
            successful,
            best_strategy: best.map(|a| a.strategy),
            best_url: best.map(|a| a.url.clone()),
            attempts,
        })
    }

    /// Probe the well-known path list on an origin and report every result.
    pub async fn discover_well_known(&self, base_url: &str) -> Result<Vec<ProbeResult>> {
        let origin = origin_of(base_url)
            .ok_or_else(|| Error::InvalidInput(format!("not a valid base URL: {}", base_url)))?;

        let mut results = Vec::with_capacity(WELL_KNOWN_PATHS.len());
        for path in WELL_KNOWN_PATHS {
            let url = format!("{}{}", origin, path);
            let raw = self
                .fetch(&url, ACCEPT_ANY_JSON, self.options.probe_timeout)
                .await;

            let found = raw.status.map(|s| (200..300).contains(&s)).unwrap_or(false);
            let body = raw.body.unwrap_or_default();
            let data = if found {
                serde_json::from_str::<Value>(&body)
                    .ok()
                    .filter(|v| !html::is_empty_value(v))
            } else {
                None
            };

            results.push(ProbeResult {
                path: path.to_string(),
                url,
                status: raw.status,
                found,
                content_type: raw.content_type,
                size: body.len(),
                preview: if found && !body.is_empty() {
                    Some(body.chars().take(200).collect())
                } else {
                    None
                },
                data,
                error: raw.error,
            });
        }

        Ok(results)
    }

    async fn run_strategy(&self, strategy: Strategy, url: &str) -> StrategyRun {
        match strategy {
            Strategy::LinkedDataAccept => {
                self.json_fetch(strategy, url, ACCEPT_LD_JSON, self.options.request_timeout)
                    .await
            }
            Strategy::JsonAccept => {
                self.json_fetch(strategy, url, ACCEPT_JSON, self.options.request_timeout)
                    .await
            }
            Strategy::WellKnownProbe => self.well_known(url).await,
            Strategy::JsonSuffix => {
                if has_json_suffix(url) {
                    StrategyRun::skipped()
                } else {
                    let suffixed = format!("{}.json", url);
                    self.json_fetch(strategy, &suffixed, ACCEPT_JSON, self.options.probe_timeout)
                        .await
                }
            }
            Strategy::HtmlEmbedded => self.html_embedded(url).await,
            Strategy::SchemeCheck => StrategyRun::skipped(),
        }
    }

    /// GET a URL and accept the body only if it parses as non-empty JSON.
    async fn json_fetch(
        &self,
        strategy: Strategy,
        url: &str,
        accept: &str,
        timeout: Duration,
    ) -> StrategyRun {
        let raw = self.fetch(url, accept, timeout).await;
        let attempt = |error: Option<String>| FetchAttempt {
            strategy,
            url: url.to_string(),
            status: raw.status,
            content_type: raw.content_type.clone(),
            error,
        };

        if raw.error.is_some() {
            return StrategyRun {
                attempts: vec![attempt(raw.error.clone())],
                resolved: None,
            };
        }
        if !raw.status.map(|s| (200..300).contains(&s)).unwrap_or(false) {
            return StrategyRun {
                attempts: vec![attempt(None)],
                resolved: None,
            };
        }

        let body = raw.body.as_deref().unwrap_or("");
        match serde_json::from_str::<Value>(body) {
            Ok(data) if !html::is_empty_value(&data) => StrategyRun {
                attempts: Vec::new(),
                resolved: Some(ResolvedDocument {
                    size_bytes: payload_size(&data),
                    data,
                    strategy,
                    url: url.to_string(),
                    content_type: raw.content_type.clone(),
                }),
            },
            Ok(_) => StrategyRun {
                attempts: vec![attempt(Some("response contained no data".to_string()))],
                resolved: None,
            },
            Err(_) => StrategyRun {
                attempts: vec![attempt(Some("response was not parseable JSON".to_string()))],
                resolved: None,
            },
        }
    }

    /// Try each well-known path on the identifier's origin.
    async fn well_known(&self, url: &str) -> StrategyRun {
        let Some(origin) = origin_of(url) else {
            return StrategyRun {
                attempts: vec![FetchAttempt {
                    strategy: Strategy::WellKnownProbe,
                    url: url.to_string(),
                    status: None,
                    content_type: None,
                    error: Some("could not determine origin".to_string()),
                }],
                resolved: None,
            };
        };

        let mut attempts = Vec::new();
        for path in WELL_KNOWN_PATHS {
            let probe_url = format!("{}{}", origin, path);
            let run = self
                .json_fetch(
                    Strategy::WellKnownProbe,
                    &probe_url,
                    ACCEPT_ANY_JSON,
                    self.options.probe_timeout,
                )
                .await;
            attempts.extend(run.attempts);
            if run.resolved.is_some() {
                return StrategyRun {
                    attempts,
                    resolved: run.resolved,
                };
            }
        }

        StrategyRun {
            attempts,
            resolved: None,
        }
    }

    /// Fetch as markup and pull out an embedded data block, falling back to
    /// page metadata.
    async fn html_embedded(&self, url: &str) -> StrategyRun {
        let raw = self
            .fetch(url, ACCEPT_HTML, self.options.request_timeout)
            .await;
        let attempt = |error: Option<String>| FetchAttempt {
            strategy: Strategy::HtmlEmbedded,
            url: url.to_string(),
            status: raw.status,
            content_type: raw.content_type.clone(),
            error,
        };

        if raw.error.is_some() {
            return StrategyRun {
                attempts: vec![attempt(raw.error.clone())],
                resolved: None,
            };
        }
        if !raw.status.map(|s| (200..300).contains(&s)).unwrap_or(false) {
            return StrategyRun {
                attempts: vec![attempt(None)],
                resolved: None,
            };
        }

        let body = raw.body.as_deref().unwrap_or("");
        let looks_like_markup = raw
            .content_type
            .as_deref()
            .map(|ct| ct.contains("html"))
            .unwrap_or(false)
            || body.trim_start().starts_with('<');
        if !looks_like_markup {
            return StrategyRun {
                attempts: vec![attempt(Some("response was not markup".to_string()))],
                resolved: None,
            };
        }

        let data = html::extract_embedded(body).or_else(|| html::page_metadata(body));
        match data {
            Some(data) => StrategyRun {
                attempts: Vec::new(),
                resolved: Some(ResolvedDocument {
                    size_bytes: payload_size(&data),
                    data,
                    strategy: Strategy::HtmlEmbedded,
                    url: url.to_string(),
                    content_type: raw.content_type.clone(),
                }),
            },
            None => StrategyRun {
                attempts: vec![attempt(Some(
                    "no embedded structured data found in markup".to_string(),
                ))],
                resolved: None,
            },
        }
    }

    async fn fetch(&self, url: &str, accept: &str, timeout: Duration) -> RawFetch {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .header(USER_AGENT, &self.options.user_agent)
            .timeout(timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                let error = if e.is_timeout() {
                    format!("request timed out after {:?}", timeout)
                } else {
                    format!("request failed: {}", e)
                };
                return RawFetch {
                    status: None,
                    content_type: None,
                    body: None,
                    error: Some(error),
                };
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        match response.text().await {
            Ok(body) => RawFetch {
                status: Some(status),
                content_type,
                body: Some(body),
                error: None,
            },
            Err(e) => RawFetch {
                status: Some(status),
                content_type,
                body: None,
                error: Some(format!("failed to read body: {}", e)),
            },
        }
    }
}

/// Whether the identifier is fetchable at all.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn scheme_attempt(url: &str) -> FetchAttempt {
    FetchAttempt {
        strategy: Strategy::SchemeCheck,
        url: url.to_string(),
        status: None,
        content_type: None,
        error: Some("not an HTTP(S) URL".to_string()),
    }
}

fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

fn has_json_suffix(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.ends_with(".json") || path.ends_with(".jsonld")
}

fn payload_size(data: &Value) -> usize {
    serde_json::to_string(data).map(|s| s.len()).unwrap_or(0)
}
