use crate::error::Result;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// Memoizing map where each key is populated at most once.
///
/// Concurrent first lookups of the same key block on a per-key cell, so the
/// initializer runs once; lookups of other keys are not held up. A failed
/// initialization leaves the slot empty and the next lookup tries again.
pub struct SingleFlight<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K: Eq + Hash, V> SingleFlight<K, V> {
    pub fn new() -> Self {
        Self { slots: Mutex::new(HashMap::new()) }
    }

    pub fn get_or_try_init<F>(&self, key: K, init: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };
        // The map lock is released here; only this key's cell is contended.
        slot.get_or_try_init(|| init().map(Arc::new)).cloned()
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
