//! Hash index implementation.

use std::collections::HashMap;
use std::hash::Hash;

/// Hash-based index for exact-match lookups.
///
/// Each key owns a bucket of record ids kept in insertion order, so a lookup
/// returns matches in the order the records entered the index. Empty buckets
/// are removed eagerly.
///
/// # Example
///
/// ```rust
/// use filecab_core::index::HashIndex;
///
/// let mut index: HashIndex<String> = HashIndex::new();
/// index.insert("PETRO".to_string(), 1);
/// index.insert("PETRO".to_string(), 4);
/// assert_eq!(index.lookup(&"PETRO".to_string()), &[1, 4]);
/// ```
#[derive(Debug, Clone)]
pub struct HashIndex<K> {
    entries: HashMap<K, Vec<i32>>,
    count: usize,
}

impl<K: Eq + Hash> Default for HashIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> HashIndex<K> {
    /// Creates a new, empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            count: 0,
        }
    }

    /// Adds `id` to the bucket for `key`.
    ///
    /// Returns false if the id was already present under that key.
    pub fn insert(&mut self, key: K, id: i32) -> bool {
        let bucket = self.entries.entry(key).or_default();
        if bucket.contains(&id) {
            return false;
        }
        bucket.push(id);
        self.count += 1;
        true
    }

    /// Removes `id` from the bucket for `key`, dropping the bucket if it
    /// becomes empty.
    pub fn remove(&mut self, key: &K, id: i32) -> bool {
        let Some(bucket) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(position) = bucket.iter().position(|&existing| existing == id) else {
            return false;
        };
        bucket.remove(position);
        self.count -= 1;
        if bucket.is_empty() {
            self.entries.remove(key);
        }
        true
    }

    /// Returns the ids stored under `key`.
    #[must_use]
    pub fn lookup(&self, key: &K) -> &[i32] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns whether a bucket exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the total number of (key, id) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.count = 0;
    }

    /// Rebuilds the index from a set of key-id pairs.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, i32)>,
    {
        self.clear();
        for (key, id) in entries {
            self.insert(key, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn insert_and_lookup() {
        let mut index = HashIndex::new();
        index.insert("key1".to_string(), 1);

        assert_eq!(index.lookup(&"key1".to_string()), &[1]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn lookup_missing() {
        let index: HashIndex<String> = HashIndex::new();
        assert!(index.lookup(&"missing".to_string()).is_empty());
    }

    #[test]
    fn bucket_keeps_insertion_order() {
        let mut index = HashIndex::new();
        index.insert("key".to_string(), 9);
        index.insert("key".to_string(), 2);
        index.insert("key".to_string(), 5);

        assert_eq!(index.lookup(&"key".to_string()), &[9, 2, 5]);
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut index = HashIndex::new();
        assert!(index.insert("key".to_string(), 1));
        assert!(!index.insert("key".to_string(), 1));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_prunes_empty_bucket() {
        let mut index = HashIndex::new();
        index.insert("key".to_string(), 1);

        assert!(index.remove(&"key".to_string(), 1));
        assert!(!index.contains_key(&"key".to_string()));
        assert!(index.is_empty());
    }

    #[test]
    fn remove_one_of_many() {
        let mut index = HashIndex::new();
        index.insert("key".to_string(), 1);
        index.insert("key".to_string(), 2);

        index.remove(&"key".to_string(), 1);

        assert_eq!(index.lookup(&"key".to_string()), &[2]);
        assert!(index.contains_key(&"key".to_string()));
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut index = HashIndex::new();
        index.insert("key".to_string(), 1);

        assert!(!index.remove(&"key".to_string(), 2));
        assert!(!index.remove(&"other".to_string(), 1));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn rebuild_index() {
        let mut index = HashIndex::new();
        index.insert("old".to_string(), 1);

        index.rebuild(vec![
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("a".to_string(), 3),
        ]);

        assert_eq!(index.len(), 3);
        assert!(!index.contains_key(&"old".to_string()));
        assert_eq!(index.lookup(&"a".to_string()), &[1, 3]);
    }

    #[test]
    fn date_key() {
        let mut index = HashIndex::new();
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        index.insert(date, 42);

        assert_eq!(index.lookup(&date), &[42]);
    }
}
