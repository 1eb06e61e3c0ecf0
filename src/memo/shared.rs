//! State shared by the synchronous and asynchronous wrappers: the store,
//! the key strategy and the counters.

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::config::StoreOptions;
use crate::memo::{CacheArgs, KeyPath, KeyStrategy, MemoStats};
use crate::store::Store;

pub(crate) struct MemoCore<A, V, S> {
    pub(crate) store: S,
    pub(crate) keys: KeyStrategy<A>,
    pub(crate) stats: MemoStats,
    _value: PhantomData<fn() -> V>,
}

impl<A, V, S> MemoCore<A, V, S>
where
    S: Store<V>,
{
    /// Builds the one store this wrapper will ever use.
    pub(crate) fn new(options: &StoreOptions) -> Self {
        Self {
            store: S::from_options(options),
            keys: KeyStrategy::Arguments,
            stats: MemoStats::new(),
            _value: PhantomData,
        }
    }
}

impl<A, V, S> MemoCore<A, V, S>
where
    A: CacheArgs,
    V: Clone,
    S: Store<V>,
{
    /// Derives the key for a call. `None` means the call must bypass the
    /// store entirely.
    pub(crate) fn key(&self, args: &A, path: KeyPath) -> Option<String> {
        match self.keys.key(args, path) {
            Ok(key) => Some(key),
            Err(err) => {
                warn!(error = %err, "could not derive cache key, calling through");
                self.stats.record_passthrough();
                None
            }
        }
    }

    /// Returns the stored value for `key`, counting the hit or miss.
    pub(crate) fn lookup(&self, key: &str) -> Option<V> {
        if self.store.has(key) {
            if let Some(value) = self.store.get(key) {
                debug!(key = %key, "cache hit");
                self.stats.record_hit();
                return Some(value);
            }
        }
        debug!(key = %key, "cache miss");
        self.stats.record_miss();
        None
    }

    pub(crate) fn fill(&self, key: String, value: &V) {
        self.store.set(key, value.clone());
    }

    pub(crate) fn refresh(&self, key: String, value: &V) {
        debug!(key = %key, "entry refreshed");
        self.stats.record_refresh();
        self.store.set(key, value.clone());
    }
}

impl<A, V, S: fmt::Debug> fmt::Debug for MemoCore<A, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCore")
            .field("store", &self.store)
            .field("keys", &self.keys)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
