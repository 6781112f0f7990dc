//! API shape tests — validates that response bodies keep the field names
//! and types the dashboard frontend expects.
//!
//! These check the serialized shapes directly rather than spinning up a
//! server; the handler logic itself is covered by the resolver and graph
//! crate integration tests.

/// POST /api/scan success response.
#[test]
fn test_scan_success_shape() {
    let response = serde_json::json!({
        "success": true,
        "id": 7,
        "url": "https://example.com/passport/123",
        "format": "verifiable_credential",
        "formatLabel": "Verifiable Credential",
        "rule": "credential context or subject",
        "strategy": "linked_data_accept",
        "contentType": "application/ld+json",
        "sizeBytes": 1420,
        "trustScore": 72,
        "completenessScore": 80,
        "product": {
            "name": "Widget",
            "manufacturer": "Acme",
        },
        "data": {"@id": "https://example.com/passport/123"},
    });

    assert!(response["success"].is_boolean());
    assert!(response["id"].is_number());
    assert!(response["format"].is_string());
    assert!(response["formatLabel"].is_string());
    assert!(response["strategy"].is_string());
    assert!(response["trustScore"].is_number());
    assert!(response["completenessScore"].is_number());
    assert!(response["product"].is_object());
    assert!(response["data"].is_object());
}

/// POST /api/scan failure response carries the attempt trail.
#[test]
fn test_scan_failure_shape() {
    let response = serde_json::json!({
        "success": false,
        "id": 8,
        "url": "https://example.com/broken",
        "error": "linked_data_accept: HTTP 404; json_accept: HTTP 404",
        "attempts": [
            {
                "strategy": "linked_data_accept",
                "url": "https://example.com/broken",
                "status": 404,
            }
        ],
    });

    assert!(response["success"].is_boolean());
    assert!(response["error"].is_string());
    assert!(response["attempts"].is_array());
    assert!(response["attempts"][0]["strategy"].is_string());
    assert!(response["attempts"][0]["status"].is_number());
}

/// GET /api/stats response.
#[test]
fn test_stats_shape() {
    let response = serde_json::json!({
        "total": 42,
        "completed": 39,
        "failed": 3,
        "last24h": 5,
        "dbSizeMb": 0.3,
    });

    assert!(response["total"].is_number());
    assert!(response["completed"].is_number());
    assert!(response["failed"].is_number());
    assert!(response["last24h"].is_number());
    assert!(response["dbSizeMb"].is_number());
}

/// POST /api/expand response: graph + structure + merged document.
#[test]
fn test_expand_shape() {
    let response = serde_json::json!({
        "graph": {
            "root": {"@id": "urn:root"},
            "links": {
                "https://ex/a": {
                    "id": "https://ex/a",
                    "status": "resolved",
                    "depth": 1,
                    "size_bytes": 120,
                }
            },
            "stats": {
                "total": 1,
                "resolved": 1,
                "failed": 0,
                "cancelled": 0,
                "pending": 0,
                "max_depth_reached": 1,
                "total_bytes": 120,
            },
        },
        "structure": {
            "nodes": [{"id": "urn:root", "label": "Root", "depth": 0, "status": "resolved"}],
            "edges": [],
        },
        "merged": {"@id": "urn:root"},
    });

    let graph = &response["graph"];
    assert!(graph["links"].is_object());
    assert!(graph["stats"]["total"].is_number());
    assert!(graph["stats"]["resolved"].is_number());
    assert!(graph["stats"]["pending"].is_number());

    let link = &graph["links"]["https://ex/a"];
    assert!(link["status"].is_string());
    assert!(link["depth"].is_number());

    assert!(response["structure"]["nodes"].is_array());
    assert!(response["structure"]["edges"].is_array());
    assert!(response["merged"].is_object());
}

/// POST /api/resolve diagnostic response.
#[test]
fn test_resolve_diagnostic_shape() {
    let response = serde_json::json!({
        "identifier": "did:web:example.com:product:123",
        "url": "https://example.com/product/123",
        "attempts": [
            {
                "strategy": "linked_data_accept",
                "url": "https://example.com/product/123",
                "status": 200,
                "content_type": "application/ld+json",
                "data": {"@id": "https://example.com/product/123"},
            }
        ],
        "successful": 1,
        "best_strategy": "linked_data_accept",
        "best_url": "https://example.com/product/123",
    });

    assert!(response["identifier"].is_string());
    assert!(response["url"].is_string());
    assert!(response["attempts"].is_array());
    assert!(response["successful"].is_number());
    assert!(response["best_strategy"].is_string());
}

/// POST /api/discover response.
#[test]
fn test_discover_shape() {
    let response = serde_json::json!({
        "baseUrl": "https://example.com",
        "pathsChecked": 9,
        "endpointsFound": 1,
        "results": [
            {
                "path": "/.well-known/did.json",
                "url": "https://example.com/.well-known/did.json",
                "status": 200,
                "found": true,
                "size": 512,
            }
        ],
        "recommendation": "Found 1 endpoint(s). Try: https://example.com/.well-known/did.json",
    });

    assert!(response["pathsChecked"].is_number());
    assert!(response["endpointsFound"].is_number());
    assert!(response["results"].is_array());
    assert!(response["results"][0]["found"].is_boolean());
    assert!(response["recommendation"].is_string());
}
