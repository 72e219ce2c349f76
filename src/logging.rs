//! Logging module
//!
//! This module configures structured logging using the tracing crate,
//! providing JSON output for production and pretty formatting for
//! development. Local logs are deliberately separate from the OTLP log
//! export: the exporter carries the normalized Connect events, tracing
//! carries the service's own diagnostics.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::error::Result;

/// Initialize the logging system
///
/// Configures tracing based on the environment:
/// - Production: JSON formatted logs
/// - Development: Pretty formatted logs with colors
pub fn init_tracing(log_level: &str, environment: &str) -> Result<()> {
    // Create environment filter from RUST_LOG or use provided log level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "connect_log_exporter={},tower_http=debug",
            log_level
        ))
    });

    // Check if we're in production
    let is_production = environment == "production";

    if is_production {
        // Production: JSON formatting
        let formatting_layer = fmt::layer()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true);

        Registry::default()
            .with(env_filter)
            .with(formatting_layer)
            .try_init()
            .map_err(|e| {
                crate::error::Error::internal(format!("Failed to initialize tracing: {}", e))
            })?;
    } else {
        // Development: Pretty formatting with colors
        let formatting_layer = fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);

        Registry::default()
            .with(env_filter)
            .with(formatting_layer)
            .try_init()
            .map_err(|e| {
                crate::error::Error::internal(format!("Failed to initialize tracing: {}", e))
            })?;
    }

    tracing::info!(
        environment = environment,
        log_level = log_level,
        "Logging initialized"
    );

    Ok(())
}

/// Create a span for Kafka message processing
#[macro_export]
macro_rules! kafka_span {
    ($partition:expr, $offset:expr) => {
        tracing::info_span!(
            "kafka_message",
            partition = $partition,
            offset = $offset,
            event_id = tracing::field::Empty,
            severity = tracing::field::Empty,
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_kafka_span_macro() {
        // The span must construct and enter cleanly with or without a
        // subscriber installed
        let span = crate::kafka_span!(1, 42);
        let _guard = span.enter();
    }
}
