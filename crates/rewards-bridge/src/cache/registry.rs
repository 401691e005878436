//! KeyedRegistry: a correlation-key → record map.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{read, write};

/// Mapping store keyed by a request-correlation identifier.
///
/// Last write wins by call order; the registry itself has no notion of which
/// request a write belongs to.
pub struct KeyedRegistry<K, V> {
    entries: RwLock<BTreeMap<K, V>>,
}

impl<K: Ord + Clone, V: Clone + PartialEq> KeyedRegistry<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or overwrite. Returns true if the stored record changed.
    pub fn upsert(&self, key: K, value: V) -> bool {
        let mut entries = write(&self.entries);
        match entries.get(&key) {
            Some(existing) if *existing == value => false,
            _ => {
                entries.insert(key, value);
                true
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        read(&self.entries).get(key).cloned()
    }

    /// Project one field of the record for `key` without cloning the whole record.
    pub fn project<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        read(&self.entries).get(key).map(f)
    }

    pub fn contains(&self, key: &K) -> bool {
        read(&self.entries).contains_key(key)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        write(&self.entries).remove(key)
    }

    /// Mutate the record for `key` in place. `f` returns whether it changed anything.
    pub fn modify(&self, key: &K, f: impl FnOnce(&mut V) -> bool) -> bool {
        write(&self.entries).get_mut(key).map(f).unwrap_or(false)
    }

    /// Mutate every record. Returns the keys whose records changed.
    pub fn modify_all(&self, mut f: impl FnMut(&K, &mut V) -> bool) -> Vec<K> {
        let mut entries = write(&self.entries);
        entries
            .iter_mut()
            .filter_map(|(k, v)| f(k, v).then(|| k.clone()))
            .collect()
    }

    /// Discard every entry and install `entries` instead. Returns true if the
    /// resulting map differs from the previous one.
    pub fn replace_all(&self, entries: impl IntoIterator<Item = (K, V)>) -> bool {
        let next: BTreeMap<K, V> = entries.into_iter().collect();
        let mut guard = write(&self.entries);
        if *guard == next {
            return false;
        }
        *guard = next;
        true
    }

    /// Copy of every entry, ordered by key.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        read(&self.entries)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.entries).is_empty()
    }

    pub fn clear(&self) {
        write(&self.entries).clear();
    }
}

impl<K: Ord + Clone, V: Clone + PartialEq> Default for KeyedRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
