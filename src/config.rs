//! Configuration module for the Connect log exporter
//!
//! This module handles loading and validating configuration from environment
//! variables, providing strongly-typed configuration structures for all
//! application components.

use envconfig::Envconfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::kafka::KafkaConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct Config {
    /// Server configuration
    #[serde(flatten)]
    #[envconfig(nested)]
    pub server: ServerConfig,

    /// Kafka configuration
    #[serde(flatten)]
    #[envconfig(nested)]
    pub kafka: KafkaConfig,

    /// OTLP export configuration
    #[serde(flatten)]
    #[envconfig(nested)]
    pub otlp: OtlpConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct ServerConfig {
    /// Host to bind to
    #[envconfig(from = "HOST", default = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,

    /// Log level
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    /// Environment (development, staging, production)
    #[envconfig(from = "ENVIRONMENT", default = "development")]
    pub environment: String,

    /// Request timeout in seconds
    #[envconfig(from = "REQUEST_TIMEOUT_SECS", default = "30")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[envconfig(from = "SHUTDOWN_TIMEOUT_SECS", default = "30")]
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Get the server address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// OTLP export configuration
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct OtlpConfig {
    /// Collector endpoint for log export (gRPC)
    #[envconfig(from = "OTLP_ENDPOINT", default = "http://localhost:4317")]
    pub endpoint: String,

    /// Service name reported on exported records
    #[envconfig(from = "OTEL_SERVICE_NAME", default = "connect-log-exporter")]
    pub service_name: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenv::dotenv().ok();

        // Parse configuration from environment
        Config::init_from_env().map_err(Error::from)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.port == 0 {
            return Err(Error::config("Server port cannot be 0"));
        }

        // Validate Kafka config
        if self.kafka.brokers.is_empty() {
            return Err(Error::config("Kafka brokers cannot be empty"));
        }

        if self.kafka.logs_topic.is_empty() {
            return Err(Error::config("Kafka logs topic cannot be empty"));
        }

        if self.kafka.replay_window_size <= 0 {
            return Err(Error::config("Replay window size must be at least 1"));
        }

        // Validate OTLP config
        if self.otlp.endpoint.is_empty() {
            return Err(Error::config("OTLP endpoint cannot be empty"));
        }

        Ok(())
    }

    /// Log configuration on startup
    pub fn log_config(&self) {
        tracing::info!(
            server_address = %self.server.address(),
            environment = %self.server.environment,
            log_level = %self.server.log_level,
            "Server configuration"
        );

        tracing::info!(
            brokers = %self.kafka.brokers,
            group_id = %self.kafka.group_id,
            logs_topic = %self.kafka.logs_topic,
            replay_from_window = %self.kafka.replay_from_window,
            replay_window_size = %self.kafka.replay_window_size,
            "Kafka configuration"
        );

        tracing::info!(
            endpoint = %self.otlp.endpoint,
            service_name = %self.otlp.service_name,
            "OTLP configuration"
        );
    }
}
