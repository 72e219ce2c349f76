//! Per-partition replay-window tracking
//!
//! When replay mode is enabled the consumer joins under a fresh group id,
//! so every assigned partition must be repositioned to the last
//! `window_size` records. The tracker owns that state: it performs the
//! one-time seek per partition per session and filters out records below
//! the computed target that an in-flight pre-seek fetch may still deliver.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use rdkafka::consumer::{Consumer, ConsumerContext, StreamConsumer};
use rdkafka::Offset;
use tracing::{debug, info};

use super::KafkaIntegrationError;

/// Timeout for broker round-trips issued while establishing a window
const BROKER_TIMEOUT: Duration = Duration::from_secs(10);

/// Queue-client operations the tracker needs to establish a window.
///
/// Abstracted from the concrete consumer so the seek/watermark protocol is
/// testable without a broker.
pub trait PartitionControl {
    /// Query the current end offset (high watermark) of a partition
    fn end_offset(&self, topic: &str, partition: i32) -> Result<i64, KafkaIntegrationError>;

    /// Move the fetch position of a partition
    fn seek_to(&self, topic: &str, partition: i32, offset: i64) -> Result<(), KafkaIntegrationError>;
}

impl<C> PartitionControl for StreamConsumer<C>
where
    C: ConsumerContext + 'static,
{
    fn end_offset(&self, topic: &str, partition: i32) -> Result<i64, KafkaIntegrationError> {
        let (_, high) = self
            .fetch_watermarks(topic, partition, BROKER_TIMEOUT)
            .map_err(|e| KafkaIntegrationError::OffsetQuery {
                partition,
                source: e,
            })?;
        Ok(high)
    }

    fn seek_to(&self, topic: &str, partition: i32, offset: i64) -> Result<(), KafkaIntegrationError> {
        self.seek(topic, partition, Offset::Offset(offset), BROKER_TIMEOUT).map_err(|e| {
            KafkaIntegrationError::Seek {
                partition,
                source: e,
            }
        })
    }
}

/// Replay state for one partition, held for the consumer session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionReplayState {
    /// Partition this state belongs to
    pub partition: i32,

    /// First offset admitted downstream
    pub target_offset: i64,

    /// Whether the seek has been issued
    pub initialized: bool,
}

/// Tracks replay windows for every partition assigned in this session.
///
/// Assignment notifications arrive on the rebalance callback path while
/// admission checks run on the record-delivery path, so all state lives
/// behind a mutex.
pub struct PartitionReplayTracker {
    window_size: i64,
    states: Mutex<HashMap<i32, PartitionReplayState>>,
    pending: Mutex<Vec<i32>>,
}

impl PartitionReplayTracker {
    /// Create a tracker replaying the last `window_size` records per
    /// partition.
    pub fn new(window_size: i64) -> Self {
        Self {
            window_size,
            states: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Record a newly assigned partition for initialization.
    ///
    /// Called from the rebalance callback, which has no consumer handle;
    /// the consumer loop drains the queue and performs the actual seek.
    pub fn enqueue_assignment(&self, partition: i32) {
        let mut pending = self.pending.lock().unwrap();
        if !pending.contains(&partition) {
            pending.push(partition);
        }
    }

    /// Take all partitions awaiting initialization.
    pub fn take_pending(&self) -> Vec<i32> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }

    /// Put a partition back for another attempt after a failed
    /// initialization. Retried on the next consumer-loop iteration.
    pub fn requeue(&self, partition: i32) {
        self.enqueue_assignment(partition);
    }

    /// Establish the replay window for an assigned partition.
    ///
    /// Idempotent per session: a partition that already has an initialized
    /// window performs no offset query and no seek. On failure no state is
    /// stored, so the partition stays uninitialized and its records remain
    /// inadmissible until a later attempt succeeds.
    pub fn on_assigned(
        &self,
        control: &dyn PartitionControl,
        topic: &str,
        partition: i32,
    ) -> Result<(), KafkaIntegrationError> {
        if self.state(partition).is_some_and(|s| s.initialized) {
            debug!(partition, "Replay window already established, skipping");
            return Ok(());
        }

        let end_offset = control.end_offset(topic, partition)?;
        let target_offset = (end_offset - self.window_size).max(0);

        // The seek moves the live fetch position; it must happen at most
        // once per partition per session, which the initialized check above
        // guarantees as long as assignment handling stays on a single task.
        control.seek_to(topic, partition, target_offset)?;

        self.states.lock().unwrap().insert(
            partition,
            PartitionReplayState {
                partition,
                target_offset,
                initialized: true,
            },
        );

        info!(
            partition,
            end_offset, target_offset, "Replay window established"
        );
        Ok(())
    }

    /// Whether a record may be forwarded downstream.
    ///
    /// Records below the target offset are stale deliveries from a
    /// pre-seek fetch and are dropped. Records for partitions without an
    /// initialized window are dropped too: their replay eligibility is
    /// unresolved, and the fail-safe direction is to withhold them.
    pub fn admits(&self, partition: i32, offset: i64) -> bool {
        self.states
            .lock()
            .unwrap()
            .get(&partition)
            .is_some_and(|state| state.initialized && offset >= state.target_offset)
    }

    /// Drop state for a revoked partition so a long-lived session does not
    /// accumulate entries for partitions it no longer owns.
    pub fn on_revoked(&self, partition: i32) {
        self.states.lock().unwrap().remove(&partition);
        self.pending.lock().unwrap().retain(|p| *p != partition);
        debug!(partition, "Cleared replay state for revoked partition");
    }

    /// Current state for a partition, if any.
    pub fn state(&self, partition: i32) -> Option<PartitionReplayState> {
        self.states.lock().unwrap().get(&partition).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scriptable stand-in for the queue client
    struct MockControl {
        end_offset: i64,
        fail_query: Mutex<bool>,
        queries: AtomicUsize,
        seeks: Mutex<Vec<(i32, i64)>>,
    }

    impl MockControl {
        fn new(end_offset: i64) -> Self {
            Self {
                end_offset,
                fail_query: Mutex::new(false),
                queries: AtomicUsize::new(0),
                seeks: Mutex::new(Vec::new()),
            }
        }

        fn fail_next_query(&self) {
            *self.fail_query.lock().unwrap() = true;
        }
    }

    impl PartitionControl for MockControl {
        fn end_offset(&self, _topic: &str, partition: i32) -> Result<i64, KafkaIntegrationError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            let mut fail = self.fail_query.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(KafkaIntegrationError::OffsetQuery {
                    partition,
                    source: rdkafka::error::KafkaError::Seek("watermark query failed".to_string()),
                });
            }
            Ok(self.end_offset)
        }

        fn seek_to(
            &self,
            _topic: &str,
            partition: i32,
            offset: i64,
        ) -> Result<(), KafkaIntegrationError> {
            self.seeks.lock().unwrap().push((partition, offset));
            Ok(())
        }
    }

    #[test]
    fn test_target_offset_computation() {
        let control = MockControl::new(100);
        let tracker = PartitionReplayTracker::new(3);

        tracker.on_assigned(&control, "connect-logs", 0).unwrap();

        let state = tracker.state(0).unwrap();
        assert!(state.initialized);
        assert_eq!(state.target_offset, 97);
        assert_eq!(*control.seeks.lock().unwrap(), vec![(0, 97)]);
    }

    #[test]
    fn test_target_offset_clamped_to_zero() {
        let control = MockControl::new(2);
        let tracker = PartitionReplayTracker::new(3);

        tracker.on_assigned(&control, "connect-logs", 0).unwrap();

        assert_eq!(tracker.state(0).unwrap().target_offset, 0);
    }

    #[test]
    fn test_admits_filters_below_target() {
        let control = MockControl::new(100);
        let tracker = PartitionReplayTracker::new(3);
        tracker.on_assigned(&control, "connect-logs", 0).unwrap();

        assert!(!tracker.admits(0, 95));
        assert!(!tracker.admits(0, 96));
        assert!(tracker.admits(0, 97));
        assert!(tracker.admits(0, 98));
    }

    #[test]
    fn test_uninitialized_partition_drops_records() {
        let tracker = PartitionReplayTracker::new(3);
        // No assignment processed yet: records must be withheld
        assert!(!tracker.admits(0, 1_000));
    }

    #[test]
    fn test_on_assigned_is_idempotent() {
        let control = MockControl::new(100);
        let tracker = PartitionReplayTracker::new(3);

        tracker.on_assigned(&control, "connect-logs", 0).unwrap();
        tracker.on_assigned(&control, "connect-logs", 0).unwrap();

        assert_eq!(control.queries.load(Ordering::SeqCst), 1);
        assert_eq!(control.seeks.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_query_leaves_partition_uninitialized() {
        let control = MockControl::new(100);
        let tracker = PartitionReplayTracker::new(3);
        control.fail_next_query();

        let result = tracker.on_assigned(&control, "connect-logs", 0);

        assert!(result.is_err());
        assert!(tracker.state(0).is_none());
        assert!(!tracker.admits(0, 99));
        assert!(control.seeks.lock().unwrap().is_empty());

        // A later attempt succeeds and initializes normally
        tracker.on_assigned(&control, "connect-logs", 0).unwrap();
        assert!(tracker.admits(0, 99));
    }

    #[test]
    fn test_revocation_clears_state() {
        let control = MockControl::new(100);
        let tracker = PartitionReplayTracker::new(3);
        tracker.on_assigned(&control, "connect-logs", 0).unwrap();

        tracker.on_revoked(0);
        assert!(tracker.state(0).is_none());
        assert!(!tracker.admits(0, 99));

        // Re-assignment after revocation establishes a fresh window
        tracker.on_assigned(&control, "connect-logs", 0).unwrap();
        assert_eq!(control.queries.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pending_queue_deduplicates() {
        let tracker = PartitionReplayTracker::new(3);
        tracker.enqueue_assignment(1);
        tracker.enqueue_assignment(1);
        tracker.enqueue_assignment(2);

        assert_eq!(tracker.take_pending(), vec![1, 2]);
        assert!(tracker.take_pending().is_empty());
    }

    #[test]
    fn test_requeue_after_failure() {
        let tracker = PartitionReplayTracker::new(3);
        tracker.enqueue_assignment(0);

        let pending = tracker.take_pending();
        assert_eq!(pending, vec![0]);

        tracker.requeue(0);
        assert_eq!(tracker.take_pending(), vec![0]);
    }

    #[test]
    fn test_partitions_tracked_independently() {
        let control = MockControl::new(50);
        let tracker = PartitionReplayTracker::new(3);
        tracker.on_assigned(&control, "connect-logs", 0).unwrap();

        assert!(tracker.admits(0, 49));
        assert!(!tracker.admits(1, 49));
    }
}
