//! Data models for the Connect log pipeline
//!
//! This module contains the envelope parser, resource-identifier extraction,
//! severity classification, and the normalized record builder.

pub mod crn;
pub mod envelope;
pub mod record;
pub mod severity;

// Re-export commonly used types
pub use crn::{extract_labels, CrnLabels};
pub use envelope::{ConnectorErrorSummary, EventData, EventEnvelope, ParsedEnvelope};
pub use record::{AttributeValue, NormalizedLogRecord, DEFAULT_BODY};
pub use severity::Severity;
