//! Specialized collection types

use std::collections::HashMap;
use std::hash::Hash;

pub use slotmap::{new_key_type, SlotMap};

/// Identity-keyed map with a lazily rebuilt flat snapshot
///
/// The map is the source of truth. Any insert or remove that changes
/// membership marks the snapshot dirty; the next call to [`Registry::snapshot`]
/// rebuilds it once, in registration order. Frames without churn never
/// allocate or re-walk the map.
#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    entries: HashMap<K, RegistryEntry<V>>,
    snapshot: Vec<V>,
    next_sequence: u64,
    dirty: bool,
}

#[derive(Debug, Clone, Copy)]
struct RegistryEntry<V> {
    value: V,
    sequence: u64,
}

impl<K, V> Registry<K, V>
where
    K: Copy + Eq + Hash,
    V: Copy,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty registry with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            snapshot: Vec::with_capacity(capacity),
            next_sequence: 0,
            dirty: false,
        }
    }

    /// Insert `value` under `key`
    ///
    /// Returns `false` and leaves the registry untouched if `key` is already
    /// present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.insert(key, RegistryEntry { value, sequence });
        self.dirty = true;
        true
    }

    /// Remove the entry for `key`, returning its value if it was present
    pub fn remove(&mut self, key: K) -> Option<V> {
        let removed = self.entries.remove(&key)?;
        self.dirty = true;
        Some(removed.value)
    }

    /// Look up the value registered under `key`
    pub fn get(&self, key: K) -> Option<V> {
        self.entries.get(&key).map(|entry| entry.value)
    }

    /// Check whether `key` is registered
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the snapshot is stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.dirty = true;
        }
    }

    /// Flat view of all values in registration order
    ///
    /// Rebuilds the cached array first if membership changed since the last
    /// call.
    pub fn snapshot(&mut self) -> &[V] {
        if self.dirty {
            self.rebuild();
        }
        &self.snapshot
    }

    /// The cached array as of the last rebuild, without rebuilding
    pub fn cached(&self) -> &[V] {
        &self.snapshot
    }

    fn rebuild(&mut self) {
        let mut ordered: Vec<&RegistryEntry<V>> = self.entries.values().collect();
        ordered.sort_unstable_by_key(|entry| entry.sequence);

        self.snapshot.clear();
        self.snapshot.extend(ordered.into_iter().map(|entry| entry.value));
        self.dirty = false;

        log::debug!("Registry snapshot rebuilt with {} entries", self.snapshot.len());
    }
}

impl<K, V> Default for Registry<K, V>
where
    K: Copy + Eq + Hash,
    V: Copy,
{
    fn default() -> Self {
        Self::new()
    }
}
