//! A table of async mutexes keyed by value.
//!
//! Callers holding a [`KeyGuard`] for the same key are serialized; different
//! keys never contend. A slot is removed from the table as soon as no guard
//! holds it and no caller is waiting on it, so the table only ever contains
//! keys that are in use.

use std::{
  collections::HashMap,
  hash::Hash,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One key's mutex and the number of [`KeyGuard`]s registered on it, whether
/// they hold the mutex or are still waiting for it.
#[derive(Debug, Default)]
struct Slot {
  mutex: Arc<AsyncMutex<()>>,
  users: usize,
}

#[derive(Debug)]
pub struct LockTable<K> {
  slots: Mutex<HashMap<K, Slot>>,
}

impl<K> Default for LockTable<K> {
  fn default() -> Self { Self { slots: Mutex::new(HashMap::new()) } }
}

impl<K: Eq + Hash + Clone> LockTable<K> {
  pub fn new() -> Self { Self::default() }

  /// Wait until `key` is free and take it.
  ///
  /// Cancel-safe: dropping the future while it waits deregisters it, so an
  /// abandoned wait never leaves its slot behind.
  pub async fn lock(&self, key: K) -> KeyGuard<'_, K> {
    let mutex = {
      let mut slots = self.slots();
      let slot = slots.entry(key.clone()).or_default();
      slot.users += 1;
      slot.mutex.clone()
    };
    // Registered from here on; the guard deregisters on drop even if the
    // wait below never finishes.
    let mut held = KeyGuard { table: self, key, guard: None };
    held.guard = Some(mutex.lock_owned().await);
    held
  }

  /// Number of keys currently held or awaited.
  pub fn len(&self) -> usize { self.slots().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn slots(&self) -> MutexGuard<'_, HashMap<K, Slot>> {
    // The map is only touched in short non-panicking sections.
    self.slots.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Exclusive hold on one key of a [`LockTable`]. Released on drop.
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct KeyGuard<'a, K: Eq + Hash + Clone> {
  table: &'a LockTable<K>,
  key:   K,
  guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyGuard<'_, K> {
  fn drop(&mut self) {
    drop(self.guard.take());
    let mut slots = self.table.slots();
    if let Some(slot) = slots.get_mut(&self.key) {
      slot.users -= 1;
      if slot.users == 0 {
        slots.remove(&self.key);
      }
    }
  }
}
