//! Connect event envelope parsing
//!
//! Connect log events arrive as semi-structured JSON. Producers are not
//! held to a contract, so every field lookup tolerates absence at any
//! nesting level and substitutes a documented default. Parsing as a whole
//! never fails: payloads that are not valid JSON degrade to a raw-fallback
//! variant that downstream code emits verbatim.

use serde_json::Value;

/// Sentinel for absent or malformed envelope fields
pub const UNKNOWN: &str = "unknown";

/// Level assumed when the event does not carry one
const DEFAULT_LEVEL: &str = "INFO";

/// Outer envelope of a Connect log event
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    /// Event type (e.g. `io.confluent.logevents.connect.app-log`)
    pub event_type: String,

    /// Unique event identifier
    pub id: String,

    /// Resource identifier string naming the originating connector
    pub source: String,

    /// Event time as carried on the wire; empty when absent
    pub time: String,

    /// Inner event payload
    pub data: EventData,
}

/// Inner `data` block of the envelope
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    /// Free-text level token, later classified onto the severity scale
    pub level: String,

    /// Connector identifier from `data.context.connectorId`
    pub connector_id: String,

    /// Generic human-readable message, when the producer supplies one
    pub message: Option<String>,

    /// Error details, present on failure events
    pub error_summary: Option<ConnectorErrorSummary>,

    /// Raw JSON text of the `summary` block, preserved for attribution
    pub summary_json: Option<String>,
}

/// Error details nested under `data.summary.connectorErrorSummary`
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorErrorSummary {
    /// Short error description
    pub message: String,

    /// Underlying cause, when reported
    pub root_cause: String,
}

impl Default for EventEnvelope {
    fn default() -> Self {
        Self {
            event_type: UNKNOWN.to_string(),
            id: UNKNOWN.to_string(),
            source: UNKNOWN.to_string(),
            time: String::new(),
            data: EventData::default(),
        }
    }
}

impl Default for EventData {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            connector_id: UNKNOWN.to_string(),
            message: None,
            error_summary: None,
            summary_json: None,
        }
    }
}

/// Result of parsing a raw payload; always a valid, emittable value
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEnvelope {
    /// Syntactically valid JSON, with absent fields defaulted
    Event(EventEnvelope),

    /// Payload was not valid JSON; carried verbatim for emission
    RawFallback {
        /// The original payload text
        payload: String,
    },
}

impl ParsedEnvelope {
    /// Parse a raw text payload. Never fails.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(root) => ParsedEnvelope::Event(EventEnvelope::from_value(&root)),
            Err(_) => ParsedEnvelope::RawFallback {
                payload: raw.to_string(),
            },
        }
    }
}

impl EventEnvelope {
    /// Extract a defaulted envelope from a parsed JSON tree.
    fn from_value(root: &Value) -> Self {
        let data_node = root.get("data");

        Self {
            event_type: text_or(root.get("type"), UNKNOWN),
            id: text_or(root.get("id"), UNKNOWN),
            source: text_or(root.get("source"), UNKNOWN),
            time: text_or(root.get("time"), ""),
            data: EventData::from_value(data_node),
        }
    }
}

impl EventData {
    fn from_value(node: Option<&Value>) -> Self {
        let context = node.and_then(|n| n.get("context"));
        let summary = node.and_then(|n| n.get("summary"));
        let error_node = summary.and_then(|s| s.get("connectorErrorSummary"));

        let error_summary = error_node.map(|e| ConnectorErrorSummary {
            message: text_or(e.get("message"), ""),
            root_cause: text_or(e.get("rootCause"), ""),
        });

        Self {
            level: text_or(node.and_then(|n| n.get("level")), DEFAULT_LEVEL),
            connector_id: text_or(context.and_then(|c| c.get("connectorId")), UNKNOWN),
            message: text(node.and_then(|n| n.get("message"))),
            error_summary,
            summary_json: summary.map(Value::to_string),
        }
    }
}

/// Read a JSON node as text, substituting a default for absent or
/// non-string values.
fn text_or(node: Option<&Value>, default: &str) -> String {
    text(node).unwrap_or_else(|| default.to_string())
}

fn text(node: Option<&Value>) -> Option<String> {
    node.and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_event(value: Value) -> EventEnvelope {
        match ParsedEnvelope::parse(&value.to_string()) {
            ParsedEnvelope::Event(envelope) => envelope,
            ParsedEnvelope::RawFallback { payload } => {
                panic!("expected envelope, got fallback for {payload}")
            },
        }
    }

    #[test]
    fn test_parse_complete_envelope() {
        let envelope = parse_event(json!({
            "type": "io.confluent.logevents.connect.app-log",
            "id": "event-1",
            "source": "crn://confluent.cloud/environment=env-1/connector=lcc-1",
            "time": "2024-03-01T10:00:00Z",
            "data": {
                "level": "ERROR",
                "context": { "connectorId": "lcc-1" },
                "summary": {
                    "connectorErrorSummary": {
                        "message": "Connector failed",
                        "rootCause": "broken config"
                    }
                }
            }
        }));

        assert_eq!(envelope.event_type, "io.confluent.logevents.connect.app-log");
        assert_eq!(envelope.id, "event-1");
        assert_eq!(envelope.time, "2024-03-01T10:00:00Z");
        assert_eq!(envelope.data.level, "ERROR");
        assert_eq!(envelope.data.connector_id, "lcc-1");

        let error = envelope.data.error_summary.expect("error summary present");
        assert_eq!(error.message, "Connector failed");
        assert_eq!(error.root_cause, "broken config");

        let summary_json = envelope.data.summary_json.expect("summary preserved");
        assert!(summary_json.contains("connectorErrorSummary"));
    }

    #[test]
    fn test_parse_empty_object_fully_defaults() {
        let envelope = parse_event(json!({}));

        assert_eq!(envelope.event_type, UNKNOWN);
        assert_eq!(envelope.id, UNKNOWN);
        assert_eq!(envelope.source, UNKNOWN);
        assert_eq!(envelope.time, "");
        assert_eq!(envelope.data.level, DEFAULT_LEVEL);
        assert_eq!(envelope.data.connector_id, UNKNOWN);
        assert!(envelope.data.message.is_none());
        assert!(envelope.data.error_summary.is_none());
        assert!(envelope.data.summary_json.is_none());
    }

    #[test]
    fn test_parse_tolerates_wrong_types() {
        // Numbers and objects where strings are expected fall back to defaults
        let envelope = parse_event(json!({
            "type": 42,
            "id": {"nested": true},
            "data": { "level": ["ERROR"] }
        }));

        assert_eq!(envelope.event_type, UNKNOWN);
        assert_eq!(envelope.id, UNKNOWN);
        assert_eq!(envelope.data.level, DEFAULT_LEVEL);
    }

    #[test]
    fn test_parse_summary_without_error_summary() {
        let envelope = parse_event(json!({
            "data": { "summary": { "otherBlock": 1 } }
        }));

        assert!(envelope.data.error_summary.is_none());
        assert_eq!(envelope.data.summary_json.as_deref(), Some(r#"{"otherBlock":1}"#));
    }

    #[test]
    fn test_parse_generic_message() {
        let envelope = parse_event(json!({
            "data": { "message": "connector paused" }
        }));

        assert_eq!(envelope.data.message.as_deref(), Some("connector paused"));
    }

    #[test]
    fn test_parse_invalid_json_yields_fallback() {
        let parsed = ParsedEnvelope::parse("not json at all {");
        assert_eq!(
            parsed,
            ParsedEnvelope::RawFallback {
                payload: "not json at all {".to_string()
            }
        );
    }

    #[test]
    fn test_parse_empty_payload_yields_fallback() {
        let parsed = ParsedEnvelope::parse("");
        assert!(matches!(parsed, ParsedEnvelope::RawFallback { .. }));
    }

    #[test]
    fn test_parse_non_object_root_defaults() {
        // A bare JSON scalar is valid JSON; lookups all default
        let envelope = parse_event(json!("just a string"));
        assert_eq!(envelope.event_type, UNKNOWN);
        assert_eq!(envelope.data.level, DEFAULT_LEVEL);
    }
}
