//! SQLite-backed scan store.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::info;

use dppscan_core::{Error, Result};

use crate::schema::SCHEMA_SQL;
use crate::types::*;

/// SQLite store for scan history and statistics.
pub struct ScanStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl ScanStore {
    /// Open or create the store. `db_dir` is the directory; the file will
    /// be `db_dir/dppscan.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("dppscan.db");

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let total = store.get_stats()?.total;
        info!(
            "ScanStore initialized: {} scans, path={}",
            total,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    /// Insert one scan result. Returns the new row ID.
    pub fn save_scan(&self, url: &str, outcome: &ScanOutcome) -> Result<i64> {
        let payload_json = outcome
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let content_hash = payload_json.as_deref().map(content_hash);

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO scans (url, status, payload_json, format, rule, trust_score,
                    completeness_score, strategy, content_type, size_bytes, content_hash,
                    error_message, fetched_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                url,
                outcome.status().as_str(),
                payload_json,
                outcome.format,
                outcome.rule,
                outcome.trust_score,
                outcome.completeness_score,
                outcome.strategy,
                outcome.content_type,
                outcome.size_bytes.map(|s| s as i64),
                content_hash,
                outcome.error,
                outcome.fetched_at,
                now_millis(),
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Most recent scans, newest first.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<ScanRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(&format!(
                "SELECT {} FROM scans ORDER BY created_at DESC, id DESC LIMIT ?1",
                COLUMNS
            ))
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], row_to_record)
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows)
    }

    /// Fetch one scan by ID.
    pub fn get_scan(&self, id: i64) -> Result<Option<ScanRecord>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(&format!("SELECT {} FROM scans WHERE id = ?1", COLUMNS))
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], row_to_record)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Delete one scan by ID.
    pub fn delete_scan(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        let affected = conn
            .prepare_cached("DELETE FROM scans WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![id])
            .map_err(|e| Error::Database(e.to_string()))?;
        if affected == 0 {
            return Err(Error::NotFound(format!("scan {}", id)));
        }
        Ok(())
    }

    /// Aggregate counters for the stats endpoint.
    pub fn get_stats(&self) -> Result<ScanStats> {
        let conn = self.conn.lock();
        let count = |sql: &str, params: &[&dyn rusqlite::ToSql]| -> Result<i64> {
            conn.prepare_cached(sql)
                .map_err(|e| Error::Database(e.to_string()))?
                .query_row(params, |row| row.get(0))
                .map_err(|e| Error::Database(e.to_string()))
        };

        let total = count("SELECT COUNT(*) FROM scans", &[])?;
        let completed = count(
            "SELECT COUNT(*) FROM scans WHERE status = 'completed'",
            &[],
        )?;
        let failed = count("SELECT COUNT(*) FROM scans WHERE status = 'failed'", &[])?;
        let cutoff = now_millis() - 24 * 60 * 60 * 1000;
        let last_24h = count(
            "SELECT COUNT(*) FROM scans WHERE created_at >= ?1",
            &[&cutoff],
        )?;

        let db_size_mb = std::fs::metadata(&self.db_path)
            .map(|m| m.len() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0);

        Ok(ScanStats {
            total,
            completed,
            failed,
            last_24h,
            db_size_mb,
        })
    }
}

const COLUMNS: &str = "id, url, status, payload_json, format, rule, trust_score, \
    completeness_score, strategy, content_type, size_bytes, content_hash, \
    error_message, fetched_at, created_at";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ScanRecord> {
    let status: String = row.get(2)?;
    let payload_json: Option<String> = row.get(3)?;
    Ok(ScanRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        status: ScanStatus::parse(&status),
        payload: payload_json.and_then(|s| serde_json::from_str(&s).ok()),
        format: row.get(4)?,
        rule: row.get(5)?,
        trust_score: row.get(6)?,
        completeness_score: row.get(7)?,
        strategy: row.get(8)?,
        content_type: row.get(9)?,
        size_bytes: row.get(10)?,
        content_hash: row.get(11)?,
        error_message: row.get(12)?,
        fetched_at: row.get(13)?,
        created_at: row.get(14)?,
    })
}

/// SHA-256 hex digest of a stored payload.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_store() -> (ScanStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ScanStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn completed_outcome() -> ScanOutcome {
        ScanOutcome {
            payload: Some(json!({"@id": "https://ex/a", "name": "A"})),
            format: Some("verifiable_credential".to_string()),
            trust_score: Some(72),
            completeness_score: Some(80),
            strategy: Some("linked_data_accept".to_string()),
            content_type: Some("application/ld+json".to_string()),
            size_bytes: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_and_get() {
        let (store, _dir) = test_store();
        let id = store.save_scan("https://ex/a", &completed_outcome()).unwrap();
        assert!(id > 0);

        let record = store.get_scan(id).unwrap().unwrap();
        assert_eq!(record.url, "https://ex/a");
        assert_eq!(record.status, ScanStatus::Completed);
        assert_eq!(record.payload.unwrap()["name"], "A");
        assert_eq!(record.trust_score, Some(72));
        assert!(record.content_hash.is_some());
    }

    #[test]
    fn test_failed_scan_has_no_payload() {
        let (store, _dir) = test_store();
        let outcome = ScanOutcome {
            error: Some("all strategies exhausted".to_string()),
            ..Default::default()
        };
        let id = store.save_scan("https://ex/broken", &outcome).unwrap();

        let record = store.get_scan(id).unwrap().unwrap();
        assert_eq!(record.status, ScanStatus::Failed);
        assert!(record.payload.is_none());
        assert_eq!(record.error_message.as_deref(), Some("all strategies exhausted"));
    }

    #[test]
    fn test_list_recent_newest_first() {
        let (store, _dir) = test_store();
        for i in 0..5 {
            store
                .save_scan(&format!("https://ex/{}", i), &completed_outcome())
                .unwrap();
        }

        let recent = store.list_recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].url, "https://ex/4");
        assert_eq!(recent[2].url, "https://ex/2");
    }

    #[test]
    fn test_delete() {
        let (store, _dir) = test_store();
        let id = store.save_scan("https://ex/a", &completed_outcome()).unwrap();
        store.delete_scan(id).unwrap();
        assert!(store.get_scan(id).unwrap().is_none());
        assert!(matches!(
            store.delete_scan(id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();
        store.save_scan("https://ex/a", &completed_outcome()).unwrap();
        store
            .save_scan(
                "https://ex/b",
                &ScanOutcome {
                    error: Some("HTTP 404".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let stats = store.get_stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.last_24h, 2);
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }
}
