//! Store Module
//!
//! The key-value contract every cache backend implements, plus the shipped
//! TTL backend.

mod entry;
mod ttl;


pub use entry::Entry;
pub use ttl::TtlStore;

use crate::config::StoreOptions;

// == Store Contract ==
/// Minimal key-value contract behind every memoized function.
///
/// Operations are total: a missing key reads as `None`, deleting a missing
/// key is a no-op. Methods take `&self` so a store can be shared with the
/// timers or tasks that maintain it.
pub trait Store<V> {
    /// Builds a fresh store from options. This is the "store constructor"
    /// a wrapper calls exactly once.
    fn from_options(options: &StoreOptions) -> Self
    where
        Self: Sized;

    /// True iff a live entry exists for `key`.
    fn has(&self, key: &str) -> bool;

    /// Returns the stored value. If `has(key)` was just true this is `Some`.
    fn get(&self, key: &str) -> Option<V>;

    /// Inserts or replaces the entry, resetting any expiry clock.
    fn set(&self, key: String, value: V);

    /// Removes the entry and anything scheduled for it.
    fn delete(&self, key: &str);

    /// Removes every entry and releases associated resources.
    fn clear(&self);

    /// Releases the store for good. Must be idempotent.
    fn stop(&self);
}
