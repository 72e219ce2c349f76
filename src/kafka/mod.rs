//! Kafka integration module for Connect log consumption
//!
//! This module provides:
//! - Event consumer with per-partition replay-window repositioning
//! - A normalization pipeline turning raw payloads into log records
//! - Rebalance handling that feeds the replay tracker

mod config;
mod consumer;
mod pipeline;
mod replay;

pub use config::KafkaConfig;
pub use consumer::{ConnectLogConsumer, ReplayContext};
pub use pipeline::{normalize, LogPipeline};
pub use replay::{PartitionControl, PartitionReplayState, PartitionReplayTracker};

use rdkafka::error::KafkaError;
use thiserror::Error;

/// Kafka-specific error types
#[derive(Debug, Error)]
pub enum KafkaIntegrationError {
    #[error("Kafka connection error: {0}")]
    ConnectionError(#[from] KafkaError),

    /// The end-offset query that anchors a replay window failed. This must
    /// propagate: silently seeking to an arbitrary offset would replay the
    /// wrong window.
    #[error("End offset query failed for partition {partition}: {source}")]
    OffsetQuery { partition: i32, source: KafkaError },

    #[error("Seek failed for partition {partition}: {source}")]
    Seek { partition: i32, source: KafkaError },

    #[error("Offset commit failed: {0}")]
    OffsetCommitError(String),
}

/// Kafka message metadata carried alongside each payload
#[derive(Debug, Clone)]
pub struct MessageMetadata {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: Option<i64>,
    pub key: Option<Vec<u8>>,
}

/// Processing result for a consumed record
#[derive(Debug)]
pub enum ProcessingResult {
    /// The record was normalized and handed to the sink
    Emitted,

    /// The record was normalized but the sink rejected it
    EmissionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_query_error_names_partition() {
        let err = KafkaIntegrationError::OffsetQuery {
            partition: 4,
            source: KafkaError::Seek("boom".to_string()),
        };
        assert!(err.to_string().contains("partition 4"));
    }

    #[test]
    fn test_connection_error_from_kafka_error() {
        let err: KafkaIntegrationError = KafkaError::Seek("down".to_string()).into();
        assert!(matches!(err, KafkaIntegrationError::ConnectionError(_)));
    }
}
