use crate::key::DataKey;
use fnv::FnvHashMap;
use std::iter::FromIterator;

/// The values referenced by the records of a frozen tree, by key.
///
/// Insertion is idempotent. Since keys are derived from content, the first value stored for a key
/// is as good as any later one.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDictionary<V>(FnvHashMap<DataKey, V>);

impl<V> Default for RecordDictionary<V> {
    fn default() -> Self {
        Self(FnvHashMap::default())
    }
}

impl<V> RecordDictionary<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// stores a value unless the key is already present. Returns true if the key was new.
    pub fn insert(&mut self, key: DataKey, value: V) -> bool {
        let mut new = false;
        self.0.entry(key).or_insert_with(|| {
            new = true;
            value
        });
        new
    }

    pub fn contains_key(&self, key: &DataKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &DataKey) -> Option<&V> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DataKey, &V)> {
        self.0.iter()
    }
}

impl<V> IntoIterator for RecordDictionary<V> {
    type Item = (DataKey, V);
    type IntoIter = std::collections::hash_map::IntoIter<DataKey, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<V> FromIterator<(DataKey, V)> for RecordDictionary<V> {
    fn from_iter<T: IntoIterator<Item = (DataKey, V)>>(iter: T) -> Self {
        let mut res = Self::new();
        for (key, value) in iter {
            res.insert(key, value);
        }
        res
    }
}
