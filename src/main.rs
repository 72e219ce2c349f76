//! Connect Log Exporter - Kafka Connect log events to OTLP
//!
//! This application consumes Connect log events from Kafka, normalizes them
//! into severity-classified log records, and exports them to an
//! OpenTelemetry collector.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use connect_log_exporter::{
    api::ApiState, config::Config, error::Result, logging, ConnectLogConsumer, HealthState,
    HealthStatus, LogSink, OtlpLogSink,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Arc::new(Config::from_env()?);

    // Validate configuration
    config.validate()?;

    // Initialize logging/tracing
    logging::init_tracing(&config.server.log_level, &config.server.environment)?;

    // Log configuration
    config.log_config();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting connect-log-exporter"
    );

    // Install the OTLP exporter; everything downstream emits through it
    let sink: Arc<dyn LogSink> = Arc::new(OtlpLogSink::init(&config.otlp)?);

    let health = Arc::new(HealthState::new());
    health
        .update_component(
            "sink",
            HealthStatus::Healthy,
            Some("OTLP exporter installed".to_string()),
        )
        .await;

    // Start the Kafka consumer
    let consumer = ConnectLogConsumer::new(config.kafka.clone(), Arc::clone(&sink))?;
    let consumer_shutdown = consumer.shutdown_handle();
    health
        .update_component(
            "kafka",
            HealthStatus::Healthy,
            Some(format!("Consumer subscribed as {}", consumer.group_id())),
        )
        .await;

    let consumer_handle = tokio::spawn(consumer.start());

    // Serve the HTTP surface until a shutdown signal arrives
    let state = ApiState {
        health,
        sink: Arc::clone(&sink),
    };
    connect_log_exporter::api::server::create_server(Arc::clone(&config), state).await?;

    // Stop the consumer and flush the exporter
    consumer_shutdown.store(true, Ordering::Relaxed);
    if let Err(e) = consumer_handle.await {
        tracing::error!("Consumer task failed to join: {}", e);
    }
    OtlpLogSink::shutdown();

    tracing::info!("connect-log-exporter shutdown complete");
    Ok(())
}
