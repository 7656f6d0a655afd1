//! Aggregation of stored records.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Collects records and reduces them into a single record.
///
/// Scalars observed more than once are summarized as `<key>_min`, `<key>_max`,
/// `<key>_mean` and `<key>_median`; a scalar observed once keeps its key.
/// Any other value type keeps its most recent value.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::INFINITY, f32::min)
}

fn max(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

fn mean(vs: &[f32]) -> f32 {
    vs.iter().sum::<f32>() / vs.len() as f32
}

fn median(mut vs: Vec<f32>) -> f32 {
    vs.sort_by(|x, y| x.total_cmp(y));
    vs[vs.len() / 2]
}

impl RecordStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Number of records stored since the last aggregation.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            keys.extend(record.keys().cloned());
        }
        keys
    }

    fn latest(&self, key: &str) -> Option<RecordValue> {
        self.data
            .iter()
            .rev()
            .find_map(|record| record.get(key).cloned())
    }

    fn scalar(&self, key: &str) -> Record {
        let vs: Vec<f32> = self
            .data
            .iter()
            .filter_map(|record| match record.get(key) {
                Some(RecordValue::Scalar(v)) => Some(*v),
                _ => None,
            })
            .collect();

        if vs.len() == 1 {
            Record::from_scalar(key, vs[0])
        } else {
            Record::from_slice(&[
                (format!("{}_min", key), RecordValue::Scalar(min(&vs))),
                (format!("{}_max", key), RecordValue::Scalar(max(&vs))),
                (format!("{}_mean", key), RecordValue::Scalar(mean(&vs))),
                (format!("{}_median", key), RecordValue::Scalar(median(vs))),
            ])
        }
    }

    /// Aggregates the stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.keys().iter() {
            match self.latest(key) {
                Some(RecordValue::Scalar(_)) => record.merge_inplace(self.scalar(key)),
                Some(value) => record.insert(key.clone(), value),
                None => {}
            }
        }
        self.data.clear();

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_scalars() {
        let mut storage = RecordStorage::new();
        for v in [3.0f32, 1.0, 2.0].iter() {
            let mut record = Record::from_scalar("episode_return", *v);
            record.insert("mode", RecordValue::String(format!("m{}", v)));
            storage.store(record);
        }
        storage.store(Record::from_scalar("loss_critic", 0.25));

        let record = storage.aggregate();
        assert_eq!(record.get_scalar("episode_return_min"), Ok(1.0));
        assert_eq!(record.get_scalar("episode_return_max"), Ok(3.0));
        assert_eq!(record.get_scalar("episode_return_mean"), Ok(2.0));
        assert_eq!(record.get_scalar("episode_return_median"), Ok(2.0));
        assert_eq!(record.get_scalar("loss_critic"), Ok(0.25));
        assert_eq!(record.get_string("mode"), Ok("m2".to_string()));
        assert!(storage.is_empty());
    }
}
