//! Resolver — multi-strategy content negotiation for passport endpoints.
//!
//! Turns an opaque identifier (URL or `did:web`) into a parsed document by
//! trying an ordered list of fetch strategies. Endpoints in the wild ignore
//! accept headers, serve JSON as HTML, or hide their data behind well-known
//! paths; each strategy covers one of those failure modes.

pub mod html;
pub mod negotiate;
pub mod types;

pub use negotiate::{is_http_url, Resolver, WELL_KNOWN_PATHS};
pub use types::*;
