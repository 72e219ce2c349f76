//! Normalization pipeline for consumed Connect log records

use std::borrow::Cow;
use std::sync::Arc;

use rdkafka::message::{BorrowedMessage, Message};
use tracing::{debug, error, warn};

use crate::models::{extract_labels, NormalizedLogRecord, ParsedEnvelope, Severity};
use crate::sink::LogSink;

use super::{MessageMetadata, ProcessingResult};

/// Normalize a raw payload into an emittable log record.
///
/// Total by construction: malformed payloads become the raw-fallback
/// record, so every consumed record yields exactly one emission.
pub fn normalize(payload: &str, partition: i32, offset: i64) -> NormalizedLogRecord {
    match ParsedEnvelope::parse(payload) {
        ParsedEnvelope::Event(envelope) => {
            let labels = extract_labels(&envelope.source);
            let severity = Severity::classify(Some(&envelope.data.level));
            NormalizedLogRecord::from_envelope(&envelope, &labels, severity, partition, offset)
        },
        ParsedEnvelope::RawFallback { payload } => {
            warn!(
                partition,
                offset, "Payload is not valid JSON, emitting raw fallback record"
            );
            NormalizedLogRecord::raw_fallback(&payload, partition, offset)
        },
    }
}

/// Pipeline that normalizes records and hands them to the sink
pub struct LogPipeline {
    sink: Arc<dyn LogSink>,
}

impl LogPipeline {
    /// Create a new pipeline emitting to the given sink
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Process a single Kafka message
    pub async fn process_message<'a>(&self, message: &BorrowedMessage<'a>) -> ProcessingResult {
        // Extract message metadata
        let metadata = MessageMetadata {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            timestamp: message.timestamp().to_millis(),
            key: message.key().map(|k| k.to_vec()),
        };

        // Span guards are not held across the emission await
        let record = {
            let span = crate::kafka_span!(metadata.partition, metadata.offset);
            let _guard = span.enter();

            debug!(
                topic = %metadata.topic,
                partition = metadata.partition,
                offset = metadata.offset,
                "Processing Connect log record"
            );

            // A missing payload is treated like an unparseable one: the
            // record still produces exactly one emission
            let payload = match message.payload() {
                Some(bytes) => String::from_utf8_lossy(bytes),
                None => Cow::Borrowed(""),
            };

            normalize(&payload, metadata.partition, metadata.offset)
        };

        match self.sink.emit(record).await {
            Ok(()) => {
                debug!(
                    partition = metadata.partition,
                    offset = metadata.offset,
                    "Log record emitted"
                );
                ProcessingResult::Emitted
            },
            Err(e) => {
                error!(
                    partition = metadata.partition,
                    offset = metadata.offset,
                    error = %e,
                    "Sink rejected log record"
                );
                ProcessingResult::EmissionFailed(e.to_string())
            },
        }
    }
}

impl Clone for LogPipeline {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
        }
    }
}
