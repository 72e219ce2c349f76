//! Synthetic test-log endpoint
//!
//! Emits two fixed records (one INFO, one ERROR) tagged with a generated
//! correlation id. Used purely to verify connectivity between the service
//! and the observability backend.

use axum::extract::State;
use chrono::Utc;
use uuid::Uuid;

use crate::api::ApiState;
use crate::error::Result;
use crate::models::{AttributeValue, NormalizedLogRecord, Severity};

/// Handler for `GET /test-log`
pub async fn send_test_log(State(state): State<ApiState>) -> Result<String> {
    let test_id = Uuid::new_v4().to_string();

    let info = test_record(
        Severity::Info,
        format!("TEST OTLP LOG: This is a manual test log with ID: {}", test_id),
        &test_id,
    );
    let error = test_record(
        Severity::Error,
        format!("TEST OTLP ERROR: This is a manual test error with ID: {}", test_id),
        &test_id,
    );

    state.sink.emit(info).await?;
    state.sink.emit(error).await?;

    tracing::info!(test_id = %test_id, "Test log records emitted");
    Ok(format!("Sent test logs with ID: {}", test_id))
}

fn test_record(severity: Severity, body: String, test_id: &str) -> NormalizedLogRecord {
    NormalizedLogRecord {
        severity,
        severity_text: severity.as_str().to_string(),
        body,
        attributes: vec![("test.id".to_string(), AttributeValue::Str(test_id.to_string()))],
        timestamp: Utc::now(),
    }
}
