//! Exact-match index from scalar values to the positions holding them.
//!
//! Keys are the raw bit patterns of the values, so lookups are O(1) and match exactly what
//! `==` would match (`-0.0` is folded onto `0.0` before hashing).

use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;

/// A scalar that can be used as a [`ValueIndex`] key.
pub trait IndexKey: Copy {
    fn key_bits(self) -> u64;
}

impl IndexKey for f64 {
    fn key_bits(self) -> u64 {
        // -0.0 + 0.0 == +0.0
        (self + 0.0).to_bits()
    }
}

impl IndexKey for f32 {
    fn key_bits(self) -> u64 {
        u64::from((self + 0.0).to_bits())
    }
}

impl IndexKey for usize {
    fn key_bits(self) -> u64 {
        self as u64
    }
}

impl IndexKey for u32 {
    fn key_bits(self) -> u64 {
        u64::from(self)
    }
}

impl IndexKey for i64 {
    fn key_bits(self) -> u64 {
        self as u64
    }
}

/// Multi-value index: every key maps to the ordered set of positions that hold it.
#[derive(Debug, Clone)]
pub struct ValueIndex<K> {
    entries: HashMap<u64, BTreeSet<usize>>,
    _key: PhantomData<K>,
}

impl<K: IndexKey> ValueIndex<K> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            _key: PhantomData,
        }
    }

    /// Index a flat list of values, each under its own position.
    pub fn build<I>(values: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut index = Self::new();
        for (position, value) in values.into_iter().enumerate() {
            index.insert(value, position);
        }
        index
    }

    pub fn insert(&mut self, value: K, position: usize) {
        self.entries
            .entry(value.key_bits())
            .or_default()
            .insert(position);
    }

    /// Drop one position from a value's set; returns whether it was present.
    pub fn remove(&mut self, value: K, position: usize) -> bool {
        let key = value.key_bits();
        let Some(positions) = self.entries.get_mut(&key) else {
            return false;
        };
        let removed = positions.remove(&position);
        if positions.is_empty() {
            self.entries.remove(&key);
        }
        removed
    }

    pub fn positions(&self, value: K) -> Option<&BTreeSet<usize>> {
        self.entries.get(&value.key_bits())
    }

    /// Ascending positions holding `value`; empty when absent.
    pub fn locate(&self, value: K) -> Vec<usize> {
        self.positions(value)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, value: K) -> bool {
        self.entries.contains_key(&value.key_bits())
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: IndexKey> Default for ValueIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
