//! TTL Store Module
//!
//! Store backend that removes each entry a fixed time after it was set,
//! using one tokio timer task per entry.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::StoreOptions;
use crate::store::{Entry, Store};

/// Entries plus the counter that tags each insertion.
struct Table<V> {
    entries: HashMap<String, Entry<V>>,
    next_generation: u64,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_generation: 0,
        }
    }
}

// == TTL Store ==
/// Fixed-TTL store. Reads never extend an entry's lifetime.
///
/// Timers hold only a weak reference to the table, so dropping the store
/// drops every entry and with it every pending timer.
///
/// When `set` runs outside a tokio runtime no timer can be scheduled; such
/// entries still read as absent once their deadline passes and are
/// reclaimed by [`TtlStore::purge_expired`] or the next write to the key.
pub struct TtlStore<V> {
    table: Arc<Mutex<Table<V>>>,
    options: StoreOptions,
}

impl<V> TtlStore<V>
where
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates an empty store with the given options.
    pub fn new(options: StoreOptions) -> Self {
        Self {
            table: Arc::new(Mutex::new(Table::default())),
            options,
        }
    }

    /// Options the store was built with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.table.lock().entries.is_empty()
    }

    /// Remaining lifetime of a live entry. `None` if the key is absent or
    /// never expires.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let table = self.table.lock();
        table
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .and_then(Entry::ttl_remaining)
    }

    // == Purge Expired ==
    /// Removes entries whose deadline has passed but whose timer never ran.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let expired: Vec<Entry<V>> = {
            let mut table = self.table.lock();
            let keys: Vec<String> = table
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired())
                .map(|(key, _)| key.clone())
                .collect();
            keys.iter()
                .filter_map(|key| table.entries.remove(key))
                .collect()
        };

        if !expired.is_empty() {
            debug!(removed = expired.len(), "purged expired entries");
        }
        expired.len()
    }

    /// Spawns the task that removes `key` at `deadline`, provided the entry
    /// is still the one tagged with `generation` by then.
    fn schedule_expiry(
        &self,
        key: String,
        generation: u64,
        deadline: Instant,
    ) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            trace!(key = %key, "no runtime available, entry will expire lazily");
            return None;
        };
        let table: Weak<Mutex<Table<V>>> = Arc::downgrade(&self.table);

        Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let Some(table) = table.upgrade() else {
                return;
            };
            let expired = {
                let mut table = table.lock();
                match table.entries.get(&key) {
                    Some(entry) if entry.generation == generation => {
                        table.entries.remove(&key)
                    }
                    _ => None,
                }
            };

            if let Some(mut entry) = expired {
                // Detach rather than abort: this task is the timer.
                entry.disarm();
                debug!(key = %key, "entry expired");
            }
        }))
    }
}

impl<V> Store<V> for TtlStore<V>
where
    V: Clone + Send + 'static,
{
    fn from_options(options: &StoreOptions) -> Self {
        Self::new(*options)
    }

    fn has(&self, key: &str) -> bool {
        let table = self.table.lock();
        table
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    fn get(&self, key: &str) -> Option<V> {
        let table = self.table.lock();
        table
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    fn set(&self, key: String, value: V) {
        let ttl = self.options.ttl();

        let replaced = {
            let mut table = self.table.lock();
            let generation = table.next_generation;
            table.next_generation += 1;

            let mut entry = Entry::new(value, ttl, generation);
            if let Some(deadline) = entry.expires_at {
                if let Some(timer) = self.schedule_expiry(key.clone(), generation, deadline) {
                    trace!(key = %key, ttl = ?ttl, "expiry scheduled");
                    entry.arm(timer);
                }
            }
            table.entries.insert(key, entry)
        };

        // Dropping the previous entry aborts its timer.
        drop(replaced);
    }

    fn delete(&self, key: &str) {
        let removed = self.table.lock().entries.remove(key);
        drop(removed);
    }

    fn clear(&self) {
        let drained = mem::take(&mut self.table.lock().entries);
        if !drained.is_empty() {
            debug!(count = drained.len(), "cleared store");
        }
        drop(drained);
    }

    fn stop(&self) {
        self.clear();
    }
}

impl<V> fmt::Debug for TtlStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlStore")
            .field("options", &self.options)
            .field("entries", &self.table.lock().entries.len())
            .finish()
    }
}
