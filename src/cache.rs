//! Memo table for the expansion pass.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Map from keys to computed results, counting lookups that hit or miss.
pub struct Cache<K, V> {
    map: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K, V> Cache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
    pub fn misses(&self) -> usize {
        self.misses
    }
}

impl<K: Hash + Eq, V> Cache<K, V> {
    /// Look up a memoized result, recording the outcome.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let res = self.map.get(key);
        if res.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        res
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_cache_counts_lookups() {
        let mut memo = Cache::<String, Vec<u32>>::new();
        assert_eq!(memo.get("sum"), None);

        memo.insert("sum".to_string(), vec![1, 2]);
        memo.insert("neg".to_string(), vec![3]);
        assert_eq!(memo.get("sum"), Some(&vec![1, 2]));
        assert_eq!(memo.get("neg"), Some(&vec![3]));
        assert_eq!(memo.get("mul"), None);

        assert_eq!(memo.hits(), 2);
        assert_eq!(memo.misses(), 2);
    }

    #[test]
    fn test_cache_insert_replaces() {
        let mut memo = Cache::<&str, i32>::new();
        memo.insert("k", 1);
        memo.insert("k", 2);
        assert_eq!(memo.get("k"), Some(&2));
    }
}
