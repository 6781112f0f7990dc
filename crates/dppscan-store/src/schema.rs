//! Database schema SQL.

/// Scan results table.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    status TEXT NOT NULL,
    payload_json TEXT,
    format TEXT,
    rule TEXT,
    trust_score INTEGER,
    completeness_score INTEGER,
    strategy TEXT,
    content_type TEXT,
    size_bytes INTEGER,
    content_hash TEXT,
    error_message TEXT,
    fetched_at TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scans_created ON scans(created_at);
CREATE INDEX IF NOT EXISTS idx_scans_status ON scans(status);
CREATE INDEX IF NOT EXISTS idx_scans_hash ON scans(content_hash);
"#;
