//! ValueCell: a single last-known value with change detection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use super::{read, write};

/// Holds the last value reported by the ledger for one scalar/aggregate field.
///
/// `set` replaces the whole value under the lock, so readers observe either
/// the old record or the new one, never a mix. Setting a value equal to the
/// current one is reported as "unchanged" and does not bump the version.
pub struct ValueCell<T> {
    value: RwLock<Option<T>>,
    version: AtomicU64,
}

impl<T: Clone + PartialEq> ValueCell<T> {
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
            version: AtomicU64::new(0),
        }
    }

    /// Overwrite the value. Returns true if it differs from the previous one.
    pub fn set(&self, value: T) -> bool {
        let mut guard = write(&self.value);
        if guard.as_ref() == Some(&value) {
            return false;
        }
        *guard = Some(value);
        self.version.fetch_add(1, Ordering::Release);
        true
    }

    /// Apply `f` to a copy of the current value and store the result. Does
    /// nothing when no value has been set, so a partial update never
    /// fabricates a record. Returns true if the stored value changed.
    pub fn modify(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut guard = write(&self.value);
        let Some(current) = guard.as_ref() else {
            return false;
        };
        let mut next = current.clone();
        f(&mut next);
        if *current == next {
            return false;
        }
        *guard = Some(next);
        self.version.fetch_add(1, Ordering::Release);
        true
    }

    pub fn try_get(&self) -> Option<T> {
        read(&self.value).clone()
    }

    /// Whether a value has been set since construction or the last clear.
    pub fn is_set(&self) -> bool {
        read(&self.value).is_some()
    }

    /// Number of changing writes so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        let mut guard = write(&self.value);
        if guard.take().is_some() {
            self.version.fetch_add(1, Ordering::Release);
        }
    }
}

impl<T: Clone + PartialEq + Default> ValueCell<T> {
    /// Last-set value, or `T::default()` if never set.
    pub fn get(&self) -> T {
        self.try_get().unwrap_or_default()
    }
}

impl<T: Clone + PartialEq> Default for ValueCell<T> {
    fn default() -> Self {
        Self::new()
    }
}
