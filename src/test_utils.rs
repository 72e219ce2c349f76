//! Test utilities
//!
//! This module provides an in-memory sink and payload fixtures for testing.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::models::NormalizedLogRecord;
use crate::sink::{LogSink, SinkError, SinkResult};

/// In-memory implementation of `LogSink` for testing
#[derive(Debug, Clone)]
pub struct MemoryLogSink {
    records: Arc<Mutex<Vec<NormalizedLogRecord>>>,
    fail_next: Arc<Mutex<bool>>,
    error_message: Arc<Mutex<Option<String>>>,
}

impl Default for MemoryLogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogSink {
    /// Create a new in-memory sink
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
            error_message: Arc::new(Mutex::new(None)),
        }
    }

    /// Configure the sink to fail on the next emission
    pub fn fail_next_emission(&self, error_message: &str) {
        *self.fail_next.lock().unwrap() = true;
        *self.error_message.lock().unwrap() = Some(error_message.to_string());
    }

    /// Get all emitted records
    pub fn records(&self) -> Vec<NormalizedLogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Clear all captured records
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }

    fn check_failure(&self) -> SinkResult<()> {
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            let msg = self
                .error_message
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| "Mock failure".to_string());
            return Err(SinkError::Emission(msg));
        }
        Ok(())
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn emit(&self, record: NormalizedLogRecord) -> SinkResult<()> {
        self.check_failure()?;
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn flush(&self) -> SinkResult<()> {
        self.check_failure()?;
        Ok(())
    }
}

/// A complete Connect error event payload as produced by the platform
pub fn connect_error_event_json() -> String {
    serde_json::json!({
        "type": "io.confluent.logevents.connect.app-log",
        "id": "a2c6bf32-4b7a-4c43-a1b4-2fe22e26e8c4",
        "source": "crn://confluent.cloud/environment=env-mwvgw/kafka=lkc-kz3jm/connector=lcc-8wypzm",
        "time": "2024-03-01T10:00:00Z",
        "data": {
            "level": "ERROR",
            "context": { "connectorId": "lcc-8wypzm" },
            "summary": {
                "connectorErrorSummary": {
                    "message": "Connector failed to start",
                    "rootCause": "Invalid credentials"
                }
            }
        }
    })
    .to_string()
}

/// A minimal informational Connect event payload
pub fn connect_info_event_json() -> String {
    serde_json::json!({
        "type": "io.confluent.logevents.connect.app-log",
        "id": "0a0a0a0a-1111-2222-3333-444444444444",
        "source": "crn://confluent.cloud/environment=env-mwvgw/kafka=lkc-kz3jm/connector=lcc-8wypzm",
        "time": "2024-03-01T11:00:00Z",
        "data": {
            "level": "INFO",
            "context": { "connectorId": "lcc-8wypzm" },
            "message": "Connector state transitioned to RUNNING"
        }
    })
    .to_string()
}
