//! Store Entry Module
//!
//! Defines a single TTL store entry: the value, its deadline and the timer
//! that will remove it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

// == Store Entry ==
/// A stored value together with its expiry bookkeeping.
///
/// Dropping an entry aborts its timer, so replacing or removing an entry
/// can never leave a live timer behind.
#[derive(Debug)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Deadline after which the entry no longer exists, None = no expiration
    pub expires_at: Option<Instant>,
    /// Identifies this incarnation of the key; timers only remove their own
    pub generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates a new entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time-to-live
    /// * `generation` - Unique marker for this insertion
    pub fn new(value: V, ttl: Option<Duration>, generation: u64) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
            generation,
            timer: None,
        }
    }

    /// Attaches the timer responsible for removing this entry.
    pub fn arm(&mut self, timer: JoinHandle<()>) {
        self.cancel();
        self.timer = Some(timer);
    }

    /// Returns true while an expiry timer is attached.
    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Aborts the attached timer, if any.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Detaches the timer without aborting it. Used by the timer itself.
    pub fn disarm(&mut self) {
        self.timer = None;
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal
    /// to its deadline.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Instant::now() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or None if no expiration is set.
    ///
    /// Saturates at zero once the deadline has passed.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}

impl<V> Drop for Entry<V> {
    fn drop(&mut self) {
        self.cancel();
    }
}
