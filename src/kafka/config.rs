//! Kafka configuration module

use envconfig::Envconfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Kafka configuration settings
#[derive(Debug, Clone, Deserialize, Serialize, Envconfig)]
pub struct KafkaConfig {
    /// Kafka broker addresses (comma-separated)
    #[serde(default = "default_brokers")]
    #[envconfig(from = "KAFKA_BROKERS", default = "localhost:9092")]
    pub brokers: String,

    /// Consumer group ID
    #[serde(default = "default_group_id")]
    #[envconfig(from = "KAFKA_GROUP_ID", default = "connect-log-exporter")]
    pub group_id: String,

    /// Topic carrying Connect log events
    #[serde(default = "default_logs_topic")]
    #[envconfig(from = "KAFKA_LOGS_TOPIC", default = "confluent-connect-log-events")]
    pub logs_topic: String,

    /// Replay the most recent window of records instead of resuming from
    /// the persisted group offset
    #[serde(default = "default_replay_from_window")]
    #[envconfig(from = "KAFKA_REPLAY_FROM_WINDOW", default = "true")]
    pub replay_from_window: bool,

    /// Number of most-recent records per partition to (re)deliver
    #[serde(default = "default_replay_window_size")]
    #[envconfig(from = "KAFKA_REPLAY_WINDOW_SIZE", default = "3")]
    pub replay_window_size: i64,

    /// Enable auto-commit (should be false for manual offset management)
    #[serde(default = "default_auto_commit")]
    #[envconfig(from = "KAFKA_AUTO_COMMIT", default = "false")]
    pub auto_commit: bool,

    /// Session timeout in milliseconds
    #[serde(default = "default_session_timeout")]
    #[envconfig(from = "KAFKA_SESSION_TIMEOUT_MS", default = "30000")]
    pub session_timeout_ms: u32,

    /// Maximum poll interval in milliseconds
    #[serde(default = "default_max_poll_interval")]
    #[envconfig(from = "KAFKA_MAX_POLL_INTERVAL_MS", default = "300000")]
    pub max_poll_interval_ms: u32,

    /// Number of processed records between offset commits
    #[serde(default = "default_commit_batch_size")]
    #[envconfig(from = "KAFKA_COMMIT_BATCH_SIZE", default = "100")]
    pub commit_batch_size: usize,

    /// Fetch min bytes
    #[serde(default = "default_fetch_min_bytes")]
    #[envconfig(from = "KAFKA_FETCH_MIN_BYTES", default = "1")]
    pub fetch_min_bytes: i32,

    /// Fetch max wait ms
    #[serde(default = "default_fetch_max_wait_ms")]
    #[envconfig(from = "KAFKA_FETCH_MAX_WAIT_MS", default = "500")]
    pub fetch_max_wait_ms: i32,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            group_id: default_group_id(),
            logs_topic: default_logs_topic(),
            replay_from_window: default_replay_from_window(),
            replay_window_size: default_replay_window_size(),
            auto_commit: default_auto_commit(),
            session_timeout_ms: default_session_timeout(),
            max_poll_interval_ms: default_max_poll_interval(),
            commit_batch_size: default_commit_batch_size(),
            fetch_min_bytes: default_fetch_min_bytes(),
            fetch_max_wait_ms: default_fetch_max_wait_ms(),
        }
    }
}

impl KafkaConfig {
    /// Create a new KafkaConfig from environment variables
    pub fn from_env() -> Result<Self, envconfig::Error> {
        <Self as envconfig::Envconfig>::init_from_env()
    }

    /// Get session timeout as Duration
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms as u64)
    }

    /// Get max poll interval as Duration
    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms as u64)
    }

    /// Consumer group id to join under for this session.
    ///
    /// In replay mode the configured id gets a random per-session suffix so
    /// the group starts without a persisted offset position and the replay
    /// window decides what is delivered. Call once per session and reuse
    /// the returned value.
    pub fn effective_group_id(&self) -> String {
        if self.replay_from_window {
            format!("{}-{}", self.group_id, Uuid::new_v4())
        } else {
            self.group_id.clone()
        }
    }

    /// Build rdkafka consumer configuration for the given effective group id
    pub fn build_consumer_config(&self, group_id: &str) -> rdkafka::ClientConfig {
        let mut config = rdkafka::ClientConfig::new();

        config
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", self.auto_commit.to_string())
            .set("session.timeout.ms", self.session_timeout_ms.to_string())
            .set(
                "max.poll.interval.ms",
                self.max_poll_interval_ms.to_string(),
            )
            .set("fetch.min.bytes", self.fetch_min_bytes.to_string())
            .set("fetch.wait.max.ms", self.fetch_max_wait_ms.to_string())
            .set("enable.partition.eof", "false")
            .set("auto.offset.reset", "latest");

        config
    }
}

// Default value functions
fn default_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_group_id() -> String {
    "connect-log-exporter".to_string()
}

fn default_logs_topic() -> String {
    "confluent-connect-log-events".to_string()
}

fn default_replay_from_window() -> bool {
    true
}

fn default_replay_window_size() -> i64 {
    3
}

fn default_auto_commit() -> bool {
    false
}

fn default_session_timeout() -> u32 {
    30000 // 30 seconds
}

fn default_max_poll_interval() -> u32 {
    300000 // 5 minutes
}

fn default_commit_batch_size() -> usize {
    100
}

fn default_fetch_min_bytes() -> i32 {
    1
}

fn default_fetch_max_wait_ms() -> i32 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KafkaConfig::default();
        assert_eq!(config.brokers, "localhost:9092");
        assert_eq!(config.group_id, "connect-log-exporter");
        assert_eq!(config.logs_topic, "confluent-connect-log-events");
        assert_eq!(config.replay_window_size, 3);
        assert!(config.replay_from_window);
        assert!(!config.auto_commit);
    }

    #[test]
    fn test_duration_conversions() {
        let config = KafkaConfig::default();
        assert_eq!(config.session_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_poll_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_effective_group_id_with_replay() {
        let config = KafkaConfig::default();
        let effective = config.effective_group_id();

        assert!(effective.starts_with("connect-log-exporter-"));
        let suffix = effective.trim_start_matches("connect-log-exporter-");
        assert!(Uuid::parse_str(suffix).is_ok());

        // Each call draws a fresh suffix; callers hold on to one per session
        assert_ne!(effective, config.effective_group_id());
    }

    #[test]
    fn test_effective_group_id_without_replay() {
        let config = KafkaConfig {
            replay_from_window: false,
            ..KafkaConfig::default()
        };
        assert_eq!(config.effective_group_id(), "connect-log-exporter");
    }

    #[test]
    fn test_consumer_config_build() {
        let config = KafkaConfig::default();
        let group_id = config.effective_group_id();
        let _consumer_config = config.build_consumer_config(&group_id);

        // Just verify that the config can be built without errors
        assert_eq!(config.brokers, "localhost:9092");
    }
}
