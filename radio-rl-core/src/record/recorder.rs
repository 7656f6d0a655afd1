use super::Record;

/// Stores records and writes their aggregation when flushed.
pub trait AggregateRecorder {
    /// Stores a record for later aggregation.
    fn store(&mut self, record: Record);

    /// Aggregates the stored records and writes the result tagged with `step`.
    fn flush(&mut self, step: i64);
}
