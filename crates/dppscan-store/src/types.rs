//! Data types for stored scans.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Terminal status of one stored scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => ScanStatus::Completed,
            _ => ScanStatus::Failed,
        }
    }
}

/// Everything known about one scan at save time.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub payload: Option<Value>,
    pub format: Option<String>,
    pub rule: Option<String>,
    pub trust_score: Option<u8>,
    pub completeness_score: Option<u8>,
    pub strategy: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: Option<usize>,
    pub error: Option<String>,
    pub fetched_at: Option<String>,
}

impl ScanOutcome {
    pub fn status(&self) -> ScanStatus {
        if self.payload.is_some() {
            ScanStatus::Completed
        } else {
            ScanStatus::Failed
        }
    }
}

/// A scan row from the database.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    pub id: i64,
    pub url: String,
    pub status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completeness_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
    pub created_at: i64,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
    pub last_24h: i64,
    pub db_size_mb: f64,
}
