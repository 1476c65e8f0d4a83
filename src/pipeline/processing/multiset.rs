use serde::Serialize;
use std::collections::BTreeMap;

/// Item → occurrence count. Keys iterate in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Multiset<K: Ord> {
    counts: BTreeMap<K, u64>,
}

impl<K: Ord> Default for Multiset<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord> Multiset<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the present values only; missing ones are never a key.
    pub fn count_present<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<K>>,
    {
        values.into_iter().flatten().collect()
    }

    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
    {
        let mut set = Self::new();
        for (key, n) in counts {
            set.insert_n(key, n);
        }
        set
    }

    pub fn insert(&mut self, key: K) {
        self.insert_n(key, 1);
    }

    pub fn insert_n(&mut self, key: K, n: u64) {
        if n > 0 {
            *self.counts.entry(key).or_insert(0) += n;
        }
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Σ min(count_a, count_b) over shared keys
    pub fn intersection_size(&self, other: &Self) -> u64 {
        let (small, large) = if self.distinct() <= other.distinct() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .counts
            .iter()
            .map(|(key, n)| (*n).min(large.get(key)))
            .sum()
    }
}

impl<K: Ord> FromIterator<K> for Multiset<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}
