//! Kafka consumer for Connect log events with replay-window repositioning

use super::{KafkaConfig, LogPipeline, PartitionReplayTracker, ProcessingResult};
use crate::error::Result;
use crate::sink::LogSink;
use anyhow::anyhow;
use futures::stream::StreamExt;
use rdkafka::consumer::{Consumer, ConsumerContext, Rebalance, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::topic_partition_list::TopicPartitionList;
use rdkafka::{ClientContext, Offset};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Consumer context that feeds rebalance events into the replay tracker.
///
/// The callback path has no access to the consumer handle, so assignments
/// are only recorded here; the consume loop performs the offset query and
/// seek with the live consumer.
pub struct ReplayContext {
    tracker: Arc<PartitionReplayTracker>,
    replay_enabled: bool,
}

impl ReplayContext {
    pub fn new(tracker: Arc<PartitionReplayTracker>, replay_enabled: bool) -> Self {
        Self {
            tracker,
            replay_enabled,
        }
    }
}

impl ClientContext for ReplayContext {}

impl ConsumerContext for ReplayContext {
    fn post_rebalance(&self, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Assign(partitions) => {
                for element in partitions.elements() {
                    debug!(partition = element.partition(), "Partition assigned");
                    if self.replay_enabled {
                        self.tracker.enqueue_assignment(element.partition());
                    }
                }
            },
            Rebalance::Revoke(partitions) => {
                for element in partitions.elements() {
                    debug!(partition = element.partition(), "Partition revoked");
                    self.tracker.on_revoked(element.partition());
                }
            },
            Rebalance::Error(e) => {
                error!("Rebalance error: {}", e);
            },
        }
    }
}

/// Event consumer that normalizes Connect log records and emits them
pub struct ConnectLogConsumer {
    /// Kafka consumer instance
    consumer: Arc<StreamConsumer<ReplayContext>>,

    /// Normalization pipeline
    pipeline: LogPipeline,

    /// Replay-window state shared with the rebalance callbacks
    tracker: Arc<PartitionReplayTracker>,

    /// Configuration
    config: KafkaConfig,

    /// Consumer group id this session joined under
    group_id: String,

    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
}

impl ConnectLogConsumer {
    /// Create a new consumer emitting normalized records to the sink
    pub fn new(config: KafkaConfig, sink: Arc<dyn LogSink>) -> Result<Self> {
        let tracker = Arc::new(PartitionReplayTracker::new(config.replay_window_size));
        let context = ReplayContext::new(Arc::clone(&tracker), config.replay_from_window);

        // Computed once: in replay mode every session joins under a fresh
        // group id so no persisted offset position applies
        let group_id = config.effective_group_id();

        let consumer: StreamConsumer<ReplayContext> = config
            .build_consumer_config(&group_id)
            .create_with_context(context)
            .map_err(|e| anyhow!("Failed to create Kafka consumer: {}", e))?;

        consumer
            .subscribe(&[&config.logs_topic])
            .map_err(|e| anyhow!("Failed to subscribe to topic: {}", e))?;

        let pipeline = LogPipeline::new(sink);

        Ok(Self {
            consumer: Arc::new(consumer),
            pipeline,
            tracker,
            config,
            group_id,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Consumer group id this session joined under
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Handle that stops the consume loop when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Start consuming messages
    pub async fn start(self) -> Result<()> {
        info!(
            topic = %self.config.logs_topic,
            group_id = %self.group_id,
            replay = self.config.replay_from_window,
            window = self.config.replay_window_size,
            "Starting Connect log consumer"
        );

        let consumer = Arc::clone(&self.consumer);
        let pipeline = self.pipeline.clone();
        let tracker = Arc::clone(&self.tracker);
        let config = self.config.clone();
        let shutdown = Arc::clone(&self.shutdown);

        // Run the consumer in a dedicated task
        let handle = tokio::spawn(async move {
            Self::consume_loop(consumer, pipeline, tracker, config, shutdown).await
        });

        handle.await.unwrap_or_else(|e| {
            error!("Consumer task panicked: {}", e);
            Err(crate::error::Error::internal("Consumer task panicked"))
        })
    }

    /// Internal consumption loop
    async fn consume_loop(
        consumer: Arc<StreamConsumer<ReplayContext>>,
        pipeline: LogPipeline,
        tracker: Arc<PartitionReplayTracker>,
        config: KafkaConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        // Track messages for batch commit
        let mut processed_offsets = TopicPartitionList::new();
        let mut messages_since_commit = 0;
        let commit_interval = Duration::from_secs(5);
        let mut last_commit = tokio::time::Instant::now();

        // Create stream from consumer
        let stream = consumer.stream();
        tokio::pin!(stream);

        loop {
            // Check shutdown signal
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Establish replay windows for partitions assigned since the
            // last iteration. A failed attempt is re-queued and retried on
            // the next pass; until it succeeds, records from that partition
            // are withheld by the admission check below.
            if config.replay_from_window {
                for partition in tracker.take_pending() {
                    if let Err(e) = tracker.on_assigned(&*consumer, &config.logs_topic, partition) {
                        warn!(
                            partition,
                            error = %e,
                            "Failed to establish replay window, will retry"
                        );
                        tracker.requeue(partition);
                    }
                }
            }

            // Get next message with timeout
            let message_result = tokio::select! {
                msg = stream.next() => msg,
                _ = sleep(Duration::from_secs(1)) => {
                    // Periodic commit check
                    if messages_since_commit > 0 && last_commit.elapsed() >= commit_interval {
                        consumer
                            .commit(&processed_offsets, rdkafka::consumer::CommitMode::Sync)
                            .map_err(|e| anyhow!("Failed to commit offsets: {}", e))?;
                        processed_offsets = TopicPartitionList::new();
                        messages_since_commit = 0;
                        last_commit = tokio::time::Instant::now();
                    }
                    continue;
                }
            };

            let message = match message_result {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    error!("Kafka consumer error: {}", e);
                    continue;
                },
                None => {
                    // No message available - continue polling
                    continue;
                },
            };

            let partition = message.partition();
            let offset = message.offset();

            // Drop records below the replay window, and records from
            // partitions whose window is not yet established
            if config.replay_from_window && !tracker.admits(partition, offset) {
                debug!(
                    partition,
                    offset, "Record below replay window or window unresolved, dropping"
                );
                continue;
            }

            // Normalize and emit. Sink failures are logged by the pipeline
            // and never abort the loop
            match pipeline.process_message(&message).await {
                ProcessingResult::Emitted => {},
                ProcessingResult::EmissionFailed(error) => {
                    warn!(partition, offset, error = %error, "Record emission failed");
                },
            }

            // Track offset for commit either way; re-delivery would not
            // make a sink failure succeed
            processed_offsets
                .add_partition_offset(&config.logs_topic, partition, Offset::Offset(offset + 1))
                .map_err(|e| anyhow!("Failed to track offset: {}", e))?;
            messages_since_commit += 1;

            // Commit offsets if batch size reached
            if messages_since_commit >= config.commit_batch_size {
                consumer
                    .commit(&processed_offsets, rdkafka::consumer::CommitMode::Sync)
                    .map_err(|e| anyhow!("Failed to commit offsets: {}", e))?;
                processed_offsets = TopicPartitionList::new();
                messages_since_commit = 0;
                last_commit = tokio::time::Instant::now();
            }
        }

        // Final commit before shutdown
        if messages_since_commit > 0 {
            info!(
                "Committing {} pending offsets before shutdown",
                messages_since_commit
            );
            consumer
                .commit(&processed_offsets, rdkafka::consumer::CommitMode::Sync)
                .map_err(|e| anyhow!("Failed to commit offsets: {}", e))?;
        }

        info!("Connect log consumer stopped");
        Ok(())
    }
}

impl Drop for ConnectLogConsumer {
    fn drop(&mut self) {
        // Ensure shutdown on drop
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryLogSink;

    fn test_consumer() -> ConnectLogConsumer {
        let config = KafkaConfig::default();
        let sink = Arc::new(MemoryLogSink::new());
        ConnectLogConsumer::new(config, sink).expect("consumer should build without a broker")
    }

    #[tokio::test]
    async fn test_consumer_creation() {
        let consumer = test_consumer();
        assert!(consumer.group_id().starts_with("connect-log-exporter-"));
    }

    #[tokio::test]
    async fn test_consumer_shutdown_flag() {
        let consumer = test_consumer();
        let shutdown = consumer.shutdown_handle();

        assert!(!shutdown.load(Ordering::Relaxed));
        shutdown.store(true, Ordering::Relaxed);
        assert!(consumer.shutdown.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_drop_sets_shutdown() {
        let consumer = test_consumer();
        let shutdown = consumer.shutdown_handle();
        drop(consumer);
        assert!(shutdown.load(Ordering::Relaxed));
    }

    #[test]
    fn test_rebalance_assign_enqueues_partitions() {
        let tracker = Arc::new(PartitionReplayTracker::new(3));
        let context = ReplayContext::new(Arc::clone(&tracker), true);

        let mut tpl = TopicPartitionList::new();
        tpl.add_partition("connect-logs", 0);
        tpl.add_partition("connect-logs", 2);

        context.post_rebalance(&Rebalance::Assign(&tpl));
        assert_eq!(tracker.take_pending(), vec![0, 2]);
    }

    #[test]
    fn test_rebalance_assign_ignored_without_replay() {
        let tracker = Arc::new(PartitionReplayTracker::new(3));
        let context = ReplayContext::new(Arc::clone(&tracker), false);

        let mut tpl = TopicPartitionList::new();
        tpl.add_partition("connect-logs", 0);

        context.post_rebalance(&Rebalance::Assign(&tpl));
        assert!(tracker.take_pending().is_empty());
    }

    #[test]
    fn test_rebalance_revoke_clears_state() {
        let tracker = Arc::new(PartitionReplayTracker::new(3));
        tracker.enqueue_assignment(1);
        let context = ReplayContext::new(Arc::clone(&tracker), true);

        let mut tpl = TopicPartitionList::new();
        tpl.add_partition("connect-logs", 1);

        context.post_rebalance(&Rebalance::Revoke(&tpl));
        assert!(tracker.take_pending().is_empty());
    }
}
