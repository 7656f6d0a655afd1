use super::{AggregateRecorder, Record};

/// A recorder that discards every record.
#[derive(Default)]
pub struct NullRecorder {}

impl NullRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self {}
    }
}

impl AggregateRecorder for NullRecorder {
    fn store(&mut self, _record: Record) {}

    fn flush(&mut self, _step: i64) {}
}
