//! The two in-memory metadata caches (spec §2, C2).
//!
//! No ready-made LRU crate shows up anywhere in the reference pack, so
//! this is a small hand-rolled bounded cache: a `HashMap` for O(1) lookup
//! plus a recency queue. Capacity is fixed at construction and eviction is
//! pure least-recently-used — entries are never invalidated on their own,
//! only evicted for space, because registry metadata is immutable once
//! published (spec §3, "Lifecycles").

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    recency: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.entries.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return;
        }

        self.recency.push_back(key);
        if self.entries.len() > self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            let key = self.recency.remove(pos).unwrap();
            self.recency.push_back(key);
        }
    }
}
