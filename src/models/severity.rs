//! Severity classification for exported log records
//!
//! Connect log events carry a free-text level token; this module maps it
//! onto the fixed severity scale the observability backend understands.

use serde::{Deserialize, Serialize};

/// Fixed ordered severity scale used for log classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Finest-grained diagnostic events
    #[serde(rename = "TRACE")]
    Trace,
    /// Diagnostic events
    #[serde(rename = "DEBUG")]
    Debug,
    /// Normal operational events
    #[serde(rename = "INFO")]
    Info,
    /// Potentially harmful situations
    #[serde(rename = "WARN")]
    Warn,
    /// Failures
    #[serde(rename = "ERROR")]
    Error,
}

impl Severity {
    /// Classify a free-text level token onto the severity scale.
    ///
    /// The mapping is total: unrecognized or missing tokens resolve to INFO,
    /// so callers never need a fallback of their own.
    pub fn classify(level: Option<&str>) -> Self {
        let Some(token) = level else {
            return Severity::Info;
        };

        match token.to_uppercase().as_str() {
            "ERROR" | "FATAL" => Severity::Error,
            "WARN" | "WARNING" => Severity::Warn,
            "DEBUG" => Severity::Debug,
            "TRACE" => Severity::Trace,
            _ => Severity::Info,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
