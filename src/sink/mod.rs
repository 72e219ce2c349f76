//! Log record sinks
//!
//! The pipeline emits through the `LogSink` seam; the production
//! implementation exports over OTLP, and tests substitute an in-memory
//! capture (`crate::test_utils::MemoryLogSink`).

pub mod otlp;

pub use otlp::OtlpLogSink;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::NormalizedLogRecord;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Sink error types
#[derive(Debug, Error)]
pub enum SinkError {
    /// Exporter could not be installed
    #[error("Exporter initialization failed: {0}")]
    Init(String),

    /// A record was rejected at emission time
    #[error("Log emission failed: {0}")]
    Emission(String),
}

/// Destination for normalized log records
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Emit a single record
    async fn emit(&self, record: NormalizedLogRecord) -> SinkResult<()>;

    /// Flush any buffered records
    async fn flush(&self) -> SinkResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_display() {
        let err = SinkError::Emission("collector unreachable".to_string());
        assert!(err.to_string().contains("collector unreachable"));
    }
}
