use super::{AggregateRecorder, Record, RecordStorage, RecordValue};
use log::debug;

/// Keeps aggregated records in memory.
///
/// Each call to [`flush`](AggregateRecorder::flush) aggregates the records
/// stored since the previous flush and appends the result, with the flush
/// step under the key `step`. Drivers read the buffer back to write reports.
#[derive(Default)]
pub struct BufferedRecorder {
    storage: RecordStorage,
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the flushed records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Number of flushed records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been flushed.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let mut record = self.storage.aggregate();
        record.insert("step", RecordValue::Scalar(step as f32));
        debug!("flush at step {}: {} values", step, record.len());
        self.buf.push(record);
    }
}
