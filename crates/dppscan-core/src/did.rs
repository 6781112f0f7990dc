//! Bidirectional mapping between `did:web` identifiers and HTTPS URLs.
//!
//! Both conversions are best-effort and never fail: anything that does not
//! parse comes back unchanged, since the result feeds a fetch layer that
//! produces its own diagnostics for bad targets.

const DID_WEB_PREFIX: &str = "did:web:";

/// Convert a `did:web` identifier to an HTTPS URL.
///
/// `did:web:example.com:product:123` becomes
/// `https://example.com/product/123`. Inputs without the `did:web:` prefix
/// are returned unchanged.
pub fn to_http_url(id: &str) -> String {
    let Some(rest) = id.strip_prefix(DID_WEB_PREFIX) else {
        return id.to_string();
    };
    if rest.is_empty() {
        return id.to_string();
    }
    let path = rest.replace(':', "/");
    format!("https://{}", path)
}

/// Convert an HTTP(S) URL back to a `did:web` identifier.
///
/// Query strings and fragments are dropped; trailing slashes are trimmed.
/// Exact inverse only for URLs previously produced by [`to_http_url`].
/// Non-HTTP(S) inputs are returned unchanged.
pub fn to_did(url: &str) -> String {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    let Some(rest) = rest else {
        return url.to_string();
    };

    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    let trimmed = rest.trim_matches('/');
    if trimmed.is_empty() {
        return url.to_string();
    }

    format!("{}{}", DID_WEB_PREFIX, trimmed.replace('/', ":"))
}

/// Whether an identifier uses the `did:` scheme at all.
pub fn is_did(id: &str) -> bool {
    id.starts_with("did:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_did_web_to_url() {
        assert_eq!(
            to_http_url("did:web:example.com:product:123"),
            "https://example.com/product/123"
        );
        assert_eq!(to_http_url("did:web:example.com"), "https://example.com");
    }

    #[test]
    fn test_non_did_passthrough() {
        assert_eq!(to_http_url("https://example.com/x"), "https://example.com/x");
        assert_eq!(to_http_url("urn:uuid:1234"), "urn:uuid:1234");
        assert_eq!(to_http_url("did:key:z6Mk"), "did:key:z6Mk");
    }

    #[test]
    fn test_url_to_did() {
        assert_eq!(
            to_did("https://example.com/product/123"),
            "did:web:example.com:product:123"
        );
        assert_eq!(to_did("https://example.com/"), "did:web:example.com");
        assert_eq!(
            to_did("https://example.com/product/123?v=2#frag"),
            "did:web:example.com:product:123"
        );
    }

    #[test]
    fn test_non_url_passthrough() {
        assert_eq!(to_did("ftp://example.com/x"), "ftp://example.com/x");
        assert_eq!(to_did("not a url"), "not a url");
        assert_eq!(to_did("https://"), "https://");
    }

    #[test]
    fn test_round_trip() {
        let urls = [
            "https://example.com/product/123",
            "https://vendor.example.org/passports/batt-9",
            "https://example.com",
        ];
        for url in urls {
            assert_eq!(to_http_url(&to_did(url)), *url);
        }
    }

    #[test]
    fn test_empty_did_body() {
        assert_eq!(to_http_url("did:web:"), "did:web:");
    }
}
