//! In-memory log of recent requests
//!
//! Diagnostic only: a bounded ring buffer of request/response pairs, shared by
//! every client in the process unless a client is given its own log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{DateTime, Utc};
use serde_json::Value;

pub const MAX_ENTRIES: usize = 100;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub request: LoggedRequest,
    pub response: LoggedResponse,
}

#[derive(Debug, Clone)]
pub struct LoggedRequest {
    pub url: String,
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct LoggedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub data: Option<Value>,
}

/// Bounded request log; the oldest entry is evicted once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct RequestLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }
}

impl RequestLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// The process-wide log.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<RequestLog> = OnceLock::new();
        GLOBAL.get_or_init(RequestLog::default).clone()
    }

    pub fn add(&self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn entries_for(&self, service: &str) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.service == service)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(service: &str, status: u16) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            service: service.to_string(),
            request: LoggedRequest {
                url: "https://example.com/api/v1/zaken".into(),
                method: "GET".into(),
                headers: Vec::new(),
                params: Vec::new(),
                data: None,
            },
            response: LoggedResponse {
                status,
                headers: Vec::new(),
                data: None,
            },
        }
    }

    #[test]
    fn evicts_oldest_entry_at_capacity() {
        let log = RequestLog::with_capacity(2);
        log.add(entry("zrc", 200));
        log.add(entry("zrc", 201));
        log.add(entry("zrc", 204));

        let statuses: Vec<u16> = log.entries().iter().map(|e| e.response.status).collect();
        assert_eq!(statuses, vec![201, 204]);
    }

    #[test]
    fn filters_by_service() {
        let log = RequestLog::default();
        log.add(entry("zrc", 200));
        log.add(entry("drc", 200));

        assert_eq!(log.entries_for("drc").len(), 1);
        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn global_log_is_shared() {
        let log = RequestLog::global();
        log.add(entry("global-log-test", 200));
        assert!(!RequestLog::global().entries_for("global-log-test").is_empty());
    }
}
