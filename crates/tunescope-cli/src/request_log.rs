// SPDX-License-Identifier: GPL-3.0-or-later
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;
use tunescope_spotify::RequestRecord;

/// A request record annotated with what the call was for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub description: String,
    #[serde(flatten)]
    pub record: RequestRecord,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogSummary {
    pub total: usize,
    pub successful: usize,
    pub rate_limited: usize,
    pub average_response_ms: f64,
}

impl LogSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }
}

/// Append-only log of observed requests.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: Vec<LogEntry>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, description: impl Into<String>, record: RequestRecord) {
        self.entries.push(LogEntry {
            description: description.into(),
            record,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn summary(&self) -> Option<LogSummary> {
        if self.entries.is_empty() {
            return None;
        }

        let total = self.entries.len();
        let count_status =
            |code: u16| self.entries.iter().filter(|e| e.record.status_code == code).count();
        let total_ms: f64 = self.entries.iter().map(|e| e.record.response_time_ms).sum();

        Some(LogSummary {
            total,
            successful: count_status(200),
            rate_limited: count_status(429),
            average_response_ms: total_ms / total as f64,
        })
    }

    /// Write the log as pretty JSON to `request_log_<YYYYMMDD_HHMMSS>.json`
    /// inside `dir`. Returns the written path, or `None` for an empty log.
    pub fn save(&self, dir: &Path, now: DateTime<Local>) -> Result<Option<PathBuf>> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        let path = dir.join(format!("request_log_{}.json", now.format("%Y%m%d_%H%M%S")));
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write request log to {}", path.display()))?;

        info!(
            target: "cli",
            path = %path.display(),
            entries = self.entries.len(),
            "request log saved"
        );
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tunescope_spotify::RateLimitHeaders;

    fn record(status_code: u16, response_time_ms: f64) -> RequestRecord {
        RequestRecord {
            endpoint: "/search?q=Drake&type=artist&limit=1".to_string(),
            status_code,
            response_time_ms,
            timestamp: Local::now(),
            rate_limit_headers: RateLimitHeaders::default(),
        }
    }

    #[test]
    fn test_summary() {
        let mut log = RequestLog::new();
        assert!(log.summary().is_none());

        log.push("Popular artist search", record(200, 100.0));
        log.push("Classic artist search", record(200, 200.0));
        log.push("Modern artist search", record(429, 30.0));
        log.push("Hip-hop artist search", record(500, 70.0));

        let summary = log.summary().unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.rate_limited, 1);
        assert!((summary.average_response_ms - 100.0).abs() < f64::EPSILON);
        assert!((summary.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_save_writes_flattened_entries() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();

        let mut log = RequestLog::new();
        let mut rec = record(429, 12.5);
        rec.rate_limit_headers.retry_after = Some("5".to_string());
        log.push("Another popular artist", rec);

        let path = log.save(dir.path(), now).unwrap().unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "request_log_20260314_150926.json"
        );

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &written[0];
        assert_eq!(entry["description"], "Another popular artist");
        assert_eq!(entry["status_code"], 429);
        assert_eq!(entry["rate_limit_headers"]["Retry-After"], "5");
        assert!(entry["timestamp"].is_string());

        let parsed: Vec<LogEntry> = serde_json::from_value(written).unwrap();
        assert_eq!(parsed[0].record.status_code, 429);
    }

    #[test]
    fn test_save_empty_log_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = RequestLog::new();

        assert!(log.save(dir.path(), Local::now()).unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
