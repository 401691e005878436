//! ListCache: ordered collection with bulk-replace, append and delete-by-id.

use std::sync::RwLock;

use super::{read, write};
use crate::types::Identified;

pub struct ListCache<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Identified + Clone + PartialEq> ListCache<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Discard the current contents. Returns true if the list changed.
    pub fn replace_all(&self, items: Vec<T>) -> bool {
        let mut guard = write(&self.items);
        if *guard == items {
            return false;
        }
        *guard = items;
        true
    }

    /// Append an item. An item whose id is already present replaces that
    /// entry in place. Returns true if the list changed.
    pub fn append(&self, item: T) -> bool {
        let mut guard = write(&self.items);
        match guard.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) if *existing == item => false,
            Some(existing) => {
                *existing = item;
                true
            }
            None => {
                guard.push(item);
                true
            }
        }
    }

    /// Replace the entry with the same id, if present.
    pub fn update(&self, item: T) -> bool {
        let mut guard = write(&self.items);
        match guard.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) if *existing != item => {
                *existing = item;
                true
            }
            _ => false,
        }
    }

    /// Remove the entry with `id`. Returns false (and does nothing) if absent.
    pub fn remove_by_id(&self, id: &str) -> bool {
        let mut guard = write(&self.items);
        let before = guard.len();
        guard.retain(|item| item.id() != id);
        guard.len() != before
    }

    /// Defensive copy of the list.
    pub fn snapshot(&self) -> Vec<T> {
        read(&self.items).clone()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        read(&self.items).get(index).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        read(&self.items).iter().any(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        read(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.items).is_empty()
    }

    pub fn clear(&self) {
        write(&self.items).clear();
    }
}

impl<T: Identified + Clone + PartialEq> Default for ListCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
