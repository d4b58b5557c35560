//! Bounded in-memory request log.
//!
//! Every sandbox call, webhook event and agent action leaves one entry here
//! for the ops dashboard to poll at `/monitor/logs`. Oldest entries are
//! evicted at capacity; nothing is persisted.

use std::{collections::VecDeque, sync::RwLock};

use {
    chrono::{DateTime, Utc},
    serde::Serialize,
};

/// One request outcome, shaped for the `/monitor/logs` JSON answer.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub endpoint: String,
    pub status: String,
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fixed-capacity ring of recent [`LogEntry`]s.
///
/// A capacity of zero disables capture entirely.
#[derive(Debug)]
pub struct RequestLog {
    entries: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record a request that completed as intended.
    pub fn record(&self, endpoint: &str, status: &str, payload: serde_json::Value) {
        self.push(LogEntry {
            time: Utc::now(),
            endpoint: endpoint.to_string(),
            status: status.to_string(),
            payload,
            error: None,
        });
    }

    /// Record a failed request together with its error detail.
    pub fn record_error(
        &self,
        endpoint: &str,
        status: &str,
        payload: serde_json::Value,
        error: impl Into<String>,
    ) {
        self.push(LogEntry {
            time: Utc::now(),
            endpoint: endpoint.to_string(),
            status: status.to_string(),
            payload,
            error: Some(error.into()),
        });
    }

    fn push(&self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }

    /// Snapshot of the ring, newest first.
    pub fn list(&self) -> Vec<LogEntry> {
        match self.entries.read() {
            Ok(entries) => entries.iter().rev().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
