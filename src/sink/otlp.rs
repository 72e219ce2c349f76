//! OTLP log exporter sink
//!
//! Converts normalized records into OpenTelemetry log records and exports
//! them in batches over gRPC.

use std::time::SystemTime;

use async_trait::async_trait;
use opentelemetry::logs::{AnyValue, LogRecord, Logger, Severity as OtelSeverity};
use opentelemetry::{Key, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs as sdklogs;
use opentelemetry_sdk::Resource;

use crate::config::OtlpConfig;
use crate::models::{AttributeValue, NormalizedLogRecord, Severity};

use super::{LogSink, SinkError, SinkResult};

/// Sink exporting records through the OTLP logs pipeline
pub struct OtlpLogSink {
    logger: sdklogs::Logger,
}

impl OtlpLogSink {
    /// Install the batch OTLP exporter and build a sink on top of it.
    ///
    /// Must be called from within a Tokio runtime; the batch processor
    /// spawns its export task there.
    pub fn init(config: &OtlpConfig) -> SinkResult<Self> {
        let logger = opentelemetry_otlp::new_pipeline()
            .logging()
            .with_log_config(sdklogs::Config::default().with_resource(Resource::new(vec![
                KeyValue::new("service.name", config.service_name.clone()),
            ])))
            .with_exporter(
                opentelemetry_otlp::new_exporter().tonic().with_endpoint(config.endpoint.clone()),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .map_err(|e| SinkError::Init(e.to_string()))?;

        Ok(Self { logger })
    }

    /// Shut down the global logger provider, flushing pending batches.
    pub fn shutdown() {
        opentelemetry::global::shutdown_logger_provider();
    }
}

#[async_trait]
impl LogSink for OtlpLogSink {
    async fn emit(&self, record: NormalizedLogRecord) -> SinkResult<()> {
        let attributes: Vec<(Key, AnyValue)> = record
            .attributes
            .into_iter()
            .map(|(key, value)| (Key::from(key), otel_value(value)))
            .collect();

        let log_record = LogRecord::builder()
            .with_timestamp(SystemTime::from(record.timestamp))
            .with_observed_timestamp(SystemTime::now())
            .with_severity_number(otel_severity(record.severity))
            .with_severity_text(record.severity_text)
            .with_body(AnyValue::from(record.body))
            .with_attributes(attributes)
            .build();

        self.logger.emit(log_record);
        Ok(())
    }

    async fn flush(&self) -> SinkResult<()> {
        // Batching is owned by the provider; an explicit flush happens on
        // shutdown
        Ok(())
    }
}

fn otel_severity(severity: Severity) -> OtelSeverity {
    match severity {
        Severity::Trace => OtelSeverity::Trace,
        Severity::Debug => OtelSeverity::Debug,
        Severity::Info => OtelSeverity::Info,
        Severity::Warn => OtelSeverity::Warn,
        Severity::Error => OtelSeverity::Error,
    }
}

fn otel_value(value: AttributeValue) -> AnyValue {
    match value {
        AttributeValue::Str(s) => AnyValue::from(s),
        AttributeValue::Int(i) => AnyValue::from(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping_is_total() {
        assert_eq!(otel_severity(Severity::Trace), OtelSeverity::Trace);
        assert_eq!(otel_severity(Severity::Debug), OtelSeverity::Debug);
        assert_eq!(otel_severity(Severity::Info), OtelSeverity::Info);
        assert_eq!(otel_severity(Severity::Warn), OtelSeverity::Warn);
        assert_eq!(otel_severity(Severity::Error), OtelSeverity::Error);
    }

    #[test]
    fn test_attribute_value_conversion() {
        assert_eq!(otel_value(AttributeValue::Int(42)), AnyValue::Int(42));
        assert_eq!(
            otel_value(AttributeValue::Str("env-1".to_string())),
            AnyValue::String("env-1".to_string().into())
        );
    }
}
