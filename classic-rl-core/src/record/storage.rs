//! Record storage and aggregation.
use super::{Record, RecordValue};
use log::warn;
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// A storage of records with aggregation.
///
/// Scalars stored under the same key more than once are aggregated into
/// `{key}_min`, `{key}_max`, `{key}_mean` and `{key}_median`. For other value types
/// the most recent value is kept.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::INFINITY, f32::min))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::NEG_INFINITY, f32::max))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stores a record in the storage.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
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
                Some(v) => {
                    warn!("Expect RecordValue::Scalar for {}, got {:?}", key, v);
                    None
                }
                None => None,
            })
            .collect();

        match vs.len() {
            0 => Record::empty(),
            1 => Record::from_scalar(key, vs[0]),
            _ => Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ]),
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();

        for key in self.get_keys().iter() {
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
