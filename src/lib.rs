//! Connect Log Exporter Library
//!
//! This library exposes the core modules of the exporter for use in
//! integration tests and as a library for other applications.

pub mod api;
pub mod config;
pub mod error;
pub mod kafka;
pub mod logging;
pub mod models;
pub mod sink;
pub mod test_utils;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use error::{Error, Result};

// Re-export model types
pub use models::{CrnLabels, EventEnvelope, NormalizedLogRecord, ParsedEnvelope, Severity};

// Re-export Kafka types
pub use kafka::{ConnectLogConsumer, KafkaConfig, PartitionReplayTracker};

// Re-export sink types
pub use sink::{LogSink, OtlpLogSink};
pub use test_utils::MemoryLogSink;

// Re-export API server functions
pub use api::server::{create_router, create_server, shutdown_signal, ApiState};

// Re-export health check types
pub use api::{
    BuildInfo, ComponentHealth, HealthResponse, HealthState, HealthStatus, ReadyResponse,
};
