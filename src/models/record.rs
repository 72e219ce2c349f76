//! Normalized log record assembly
//!
//! The builder composes a parsed envelope, extracted resource labels, and a
//! classified severity into the record shape the sink expects. It is a pure
//! transform over already-defaulted inputs and has no failure modes.

use chrono::{DateTime, Utc};

use super::crn::CrnLabels;
use super::envelope::EventEnvelope;
use super::severity::Severity;

/// Body used when the event carries no message of its own
pub const DEFAULT_BODY: &str = "Connect Log Event";

/// A single attribute value on an emitted record
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String attribute
    Str(String),
    /// Integer attribute (Kafka partition/offset)
    Int(i64),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

/// Severity-classified, attributed log record ready for the sink
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLogRecord {
    /// Classified severity
    pub severity: Severity,

    /// The original level token as received
    pub severity_text: String,

    /// Human-readable body
    pub body: String,

    /// Attribute set; insertion order is preserved
    pub attributes: Vec<(String, AttributeValue)>,

    /// Event time, falling back to processing time
    pub timestamp: DateTime<Utc>,
}

impl NormalizedLogRecord {
    /// Build a record from a parsed envelope and its derived labels.
    ///
    /// Body selection: a non-empty connector error message wins, then a
    /// generic `data.message`, then the fixed default.
    pub fn from_envelope(
        envelope: &EventEnvelope,
        labels: &CrnLabels,
        severity: Severity,
        partition: i32,
        offset: i64,
    ) -> Self {
        let mut attributes = core_attributes(envelope, labels, partition, offset);

        if let Some(error) = &envelope.data.error_summary {
            if !error.message.is_empty() {
                attributes.push(("connector.error.message".to_string(), error.message.as_str().into()));
            }
            if !error.root_cause.is_empty() {
                attributes
                    .push(("connector.error.root_cause".to_string(), error.root_cause.as_str().into()));
            }
        }

        if let Some(summary) = &envelope.data.summary_json {
            attributes.push(("summary".to_string(), summary.as_str().into()));
        }

        let body = envelope
            .data
            .error_summary
            .as_ref()
            .map(|e| e.message.as_str())
            .filter(|m| !m.is_empty())
            .or(envelope.data.message.as_deref())
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_BODY)
            .to_string();

        Self {
            severity,
            severity_text: envelope.data.level.clone(),
            body,
            attributes,
            timestamp: resolve_timestamp(&envelope.time),
        }
    }

    /// Build the fallback record for a payload that failed to parse.
    ///
    /// The raw payload becomes the body so the event is still auditable,
    /// and the severity is forced to ERROR.
    pub fn raw_fallback(payload: &str, partition: i32, offset: i64) -> Self {
        let envelope = EventEnvelope::default();
        let labels = CrnLabels::default();

        Self {
            severity: Severity::Error,
            severity_text: Severity::Error.as_str().to_string(),
            body: payload.to_string(),
            attributes: core_attributes(&envelope, &labels, partition, offset),
            timestamp: Utc::now(),
        }
    }

    /// Look up an attribute by key
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Attributes present on every record, with `"unknown"` sentinels where the
/// envelope could not supply a value.
fn core_attributes(
    envelope: &EventEnvelope,
    labels: &CrnLabels,
    partition: i32,
    offset: i64,
) -> Vec<(String, AttributeValue)> {
    vec![
        ("event.type".to_string(), envelope.event_type.as_str().into()),
        ("event.id".to_string(), envelope.id.as_str().into()),
        ("event.source".to_string(), envelope.source.as_str().into()),
        ("event.time".to_string(), envelope.time.as_str().into()),
        ("connector.id".to_string(), envelope.data.connector_id.as_str().into()),
        ("connector.name".to_string(), labels.connector.as_str().into()),
        ("environment".to_string(), labels.environment.as_str().into()),
        ("kafka.partition".to_string(), AttributeValue::Int(partition as i64)),
        ("kafka.offset".to_string(), AttributeValue::Int(offset)),
    ]
}

/// Parse the envelope time as RFC3339; fall back to "now" when absent or
/// malformed.
fn resolve_timestamp(time: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(time).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}
