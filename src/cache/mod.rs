//! Content-addressed caches (C1, spec §4.1).
//!
//! Four logical caches (font, outline, bitmap, composite) are all
//! instances of the same generic [`Cache`]: `get` constructs on miss via a
//! caller-supplied closure, entries are shared via [`Rc`] (so `inc_ref` is
//! simply cloning the `Rc` returned by `get`, and `dec_ref` is dropping
//! it), and [`Cache::cut`] evicts least-recently-used *unreferenced*
//! entries (`Rc::strong_count == 1`) until the tracked size is at or below
//! the requested bound.
//!
//! This mirrors the epoch-scan LRU in the teacher's `lru_cache.rs`, generalized
//! from a fixed entry-count bound to an arbitrary caller-defined size metric
//! (entry count for the outline cache, summed byte footprint for the bitmap
//! and composite caches) and adapted to use `Rc` strong counts in place of a
//! hand-rolled reference count, since that is the idiomatic single-threaded
//! equivalent (see DESIGN.md).

use hashbrown::HashMap;
use std::hash::Hash;
use std::rc::Rc;

pub mod keys;
pub use keys::{BitmapHashKey, BitmapRef, CompositeKey, Hinting, OutlineHashKey, OutlineRef};

struct Entry<V> {
    value: Rc<V>,
    size: usize,
    epoch: u64,
}

/// A construct-on-miss, size-bounded, LRU-evicted cache.
pub struct Cache<K, V> {
    entries: HashMap<K, Entry<V>>,
    epoch: u64,
    total_size: usize,
}

impl<K: Eq + Hash + Clone, V> Cache<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            epoch: 0,
            total_size: 0,
        }
    }

    /// Number of live entries (referenced or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Aggregate size of all retained entries, as tracked via each
    /// construct callback's returned size contribution.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Fetches the value for `key`, constructing it via `construct` on a
    /// miss. `construct` returns the value along with its sizing
    /// contribution (byte footprint, or `1` for count-bounded caches).
    pub fn get(&mut self, key: K, construct: impl FnOnce(&K) -> (V, usize)) -> Rc<V> {
        self.epoch += 1;
        let epoch = self.epoch;
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.epoch = epoch;
            return Rc::clone(&entry.value);
        }
        let (value, size) = construct(&key);
        let value = Rc::new(value);
        self.entries.insert(
            key,
            Entry {
                value: Rc::clone(&value),
                size,
                epoch,
            },
        );
        self.total_size += size;
        value
    }

    /// Looks up `key` without constructing; does not bump its epoch as a
    /// fresh access, since callers use this only for introspection.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<Rc<V>> {
        self.entries.get(key).map(|e| Rc::clone(&e.value))
    }

    /// Evicts least-recently-used unreferenced entries (`Rc::strong_count
    /// == 1`, i.e. only this cache holds them) until `total_size <=
    /// max_size`. Entries still referenced by a live `GlyphInfo`,
    /// `BitmapHashKey`, or `CombinedBitmapInfo` are never evicted,
    /// matching the "callers must release references" contract.
    pub fn cut(&mut self, max_size: usize) {
        if self.total_size <= max_size {
            return;
        }
        // Collect evictable entries sorted oldest-epoch-first.
        let mut candidates: Vec<(K, u64, usize)> = self
            .entries
            .iter()
            .filter(|(_, e)| Rc::strong_count(&e.value) == 1)
            .map(|(k, e)| (k.clone(), e.epoch, e.size))
            .collect();
        candidates.sort_by_key(|(_, epoch, _)| *epoch);
        for (key, _, size) in candidates {
            if self.total_size <= max_size {
                break;
            }
            self.entries.remove(&key);
            self.total_size -= size;
        }
    }

    /// Drops every entry, referenced or not (used for full-renderer teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_size = 0;
    }
}

impl<K: Eq + Hash + Clone, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_on_miss_then_hit() {
        let mut cache: Cache<u32, i32> = Cache::new();
        let mut constructs = 0;
        let v1 = cache.get(1, |_| {
            constructs += 1;
            (100, 1)
        });
        assert_eq!(*v1, 100);
        let v2 = cache.get(1, |_| {
            constructs += 1;
            (999, 1)
        });
        assert_eq!(*v2, 100);
        assert_eq!(constructs, 1);
    }

    #[test]
    fn cut_evicts_oldest_unreferenced_first() {
        let mut cache: Cache<u32, i32> = Cache::new();
        cache.get(1, |_| (1, 1));
        cache.get(2, |_| (2, 1));
        let kept = cache.get(3, |_| (3, 1));
        assert_eq!(cache.total_size(), 3);
        cache.cut(1);
        // key 3 is still referenced via `kept`, so it must survive even
        // though it was the most-recently-inserted.
        assert!(cache.peek(&3).is_some());
        drop(kept);
        assert_eq!(cache.total_size(), 1);
    }

    #[test]
    fn referenced_entries_survive_cut() {
        let mut cache: Cache<u32, i32> = Cache::new();
        let held = cache.get(1, |_| (1, 10));
        cache.cut(0);
        assert_eq!(cache.total_size(), 10);
        drop(held);
        cache.cut(0);
        assert_eq!(cache.total_size(), 0);
    }
}
