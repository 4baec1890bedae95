//! Batch sink: the hand-off to the external ingestion endpoint.
//!
//! RULE: one batch in flight at a time, in event order. The first failed
//! batch aborts the rest; nothing is retried.

use crate::{
    error::{GenError, GenResult},
    event::EventRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The shape the ingestion endpoint expects: an event name plus a flat
/// property bag carrying identity, time and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    pub event: String,
    pub properties: Map<String, Value>,
}

/// Maps an internal record to the sink's field names.
pub type Projection = fn(&EventRecord) -> GenResult<SinkRecord>;

/// Default projection: `distinct_id`, `time` (epoch seconds),
/// `$insert_id` (for server-side dedup), `period`, then every payload
/// field of the event.
pub fn project(record: &EventRecord) -> GenResult<SinkRecord> {
    let mut properties = Map::new();
    properties.insert("distinct_id".into(), Value::String(record.user_id.clone()));
    properties.insert("time".into(), Value::from(record.timestamp.timestamp()));
    properties.insert("$insert_id".into(), Value::String(record.event_id.clone()));
    properties.insert("period".into(), Value::String(record.period.to_string()));
    if let Value::Object(payload) = serde_json::to_value(&record.kind)? {
        for (k, v) in payload {
            if k != "event" {
                properties.insert(k, v);
            }
        }
    }
    Ok(SinkRecord {
        event: record.name().to_string(),
        properties,
    })
}

pub trait BatchSink {
    fn max_batch_size(&self) -> usize;

    /// Deliver one batch. Any error is fatal for the run.
    fn submit(&mut self, batch: &[SinkRecord]) -> GenResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub batches: usize,
    pub records: usize,
}

/// Project every record, chunk by the sink's batch size, and submit in
/// order. Stops at the first failure, reporting its batch index.
pub fn submit_all(
    records: &[EventRecord],
    sink: &mut dyn BatchSink,
    projection: Projection,
) -> GenResult<UploadSummary> {
    let size = sink.max_batch_size().max(1);
    let projected = records.iter().map(projection).collect::<GenResult<Vec<_>>>()?;
    let mut summary = UploadSummary { batches: 0, records: 0 };
    for (batch, chunk) in projected.chunks(size).enumerate() {
        sink.submit(chunk).map_err(|e| match e {
            GenError::Transport { .. } => e,
            other => GenError::Transport {
                batch,
                message: other.to_string(),
            },
        })?;
        summary.batches += 1;
        summary.records += chunk.len();
        log::info!(
            "submitted batch {} ({} records, {}/{} total)",
            batch + 1,
            chunk.len(),
            summary.records,
            projected.len()
        );
    }
    Ok(summary)
}

/// Collects batches in memory. Can be told to fail on a given batch.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batch_size: usize,
    pub batches: Vec<Vec<SinkRecord>>,
    pub fail_on_batch: Option<usize>,
}

impl MemorySink {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }
}

impl BatchSink for MemorySink {
    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    fn submit(&mut self, batch: &[SinkRecord]) -> GenResult<()> {
        if self.fail_on_batch == Some(self.batches.len()) {
            return Err(GenError::Transport {
                batch: self.batches.len(),
                message: "simulated failure".into(),
            });
        }
        self.batches.push(batch.to_vec());
        Ok(())
    }
}
