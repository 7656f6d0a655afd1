//! Record and its values.
use crate::error::RadioRlError;
use std::collections::{
    hash_map::{IntoIter, Iter, Keys},
    HashMap,
};

/// A value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, such as a loss or a reward.
    Scalar(f32),

    /// A vector, such as per-user throughput.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

/// Named values produced during training or evaluation.
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record holding a single scalar.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a value, replacing any previous value under the same key.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Consumes the record into an iterator over key-value pairs.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Returns the value stored under `k`.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records. Values of `record` win on key collisions.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges `record` into `self`. Values of `record` win on key collisions.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Returns the scalar stored under `k`.
    pub fn get_scalar(&self, k: &str) -> Result<f32, RadioRlError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(RadioRlError::RecordValueTypeError("Scalar".to_string())),
            None => Err(RadioRlError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns the vector stored under `k`.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, RadioRlError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(RadioRlError::RecordValueTypeError("Array1".to_string())),
            None => Err(RadioRlError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns the string stored under `k`.
    pub fn get_string(&self, k: &str) -> Result<String, RadioRlError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(RadioRlError::RecordValueTypeError("String".to_string())),
            None => Err(RadioRlError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns `true` if the record holds no value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_scalar_errors() {
        let mut record = Record::from_scalar("loss_critic", 0.5);
        record.insert("name", RecordValue::String("ddpg".into()));

        assert_eq!(record.get_scalar("loss_critic"), Ok(0.5));
        assert_eq!(
            record.get_scalar("loss_actor"),
            Err(RadioRlError::RecordKeyError("loss_actor".into()))
        );
        assert_eq!(
            record.get_scalar("name"),
            Err(RadioRlError::RecordValueTypeError("Scalar".into()))
        );
    }

    #[test]
    fn test_merge_overrides() {
        let r1 = Record::from_slice(&[
            ("reward", RecordValue::Scalar(1.0)),
            ("current_users", RecordValue::Scalar(10.0)),
        ]);
        let r2 = Record::from_scalar("reward", 2.0);
        let merged = r1.merge(r2);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get_scalar("reward"), Ok(2.0));
        assert_eq!(merged.get_scalar("current_users"), Ok(10.0));
    }
}
