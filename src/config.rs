//! Configuration Module
//!
//! Store options supplied once when a store is constructed.

use std::env;
use std::time::Duration;

use crate::error::{MemoError, Result};

/// Options handed to a store at construction time.
///
/// `max_size` is accepted and reported but no store enforces it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Fixed time-to-live for every entry; `None` or zero disables expiry
    pub max_age: Option<Duration>,
    /// Upper bound on entry count (not enforced)
    pub max_size: Option<usize>,
}

impl StoreOptions {
    // == Constructors ==
    /// Options without expiry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with the given time-to-live.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            max_size: None,
        }
    }

    /// Options with a time-to-live given in (possibly fractional) seconds.
    ///
    /// Fails with [`MemoError::InvalidArgument`] for negative, NaN or
    /// infinite values.
    pub fn from_secs(secs: f64) -> Result<Self> {
        Ok(Self::with_max_age(parse_max_age(secs)?))
    }

    /// Sets the (unenforced) size bound.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Creates options from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_MAX_AGE` - Entry TTL in seconds, fractional allowed (default: none)
    /// - `MEMO_MAX_SIZE` - Size bound, accepted but unenforced (default: none)
    pub fn from_env() -> Result<Self> {
        let max_age = match env::var("MEMO_MAX_AGE") {
            Ok(raw) => {
                let secs: f64 = raw.trim().parse().map_err(|_| {
                    MemoError::InvalidArgument(format!("MEMO_MAX_AGE is not a number: {raw}"))
                })?;
                Some(parse_max_age(secs)?)
            }
            Err(_) => None,
        };

        let max_size = match env::var("MEMO_MAX_SIZE") {
            Ok(raw) => Some(raw.trim().parse().map_err(|_| {
                MemoError::InvalidArgument(format!("MEMO_MAX_SIZE is not a count: {raw}"))
            })?),
            Err(_) => None,
        };

        Ok(Self { max_age, max_size })
    }

    // == Effective TTL ==
    /// The TTL that stores should actually apply; zero counts as none.
    pub fn ttl(&self) -> Option<Duration> {
        self.max_age.filter(|age| !age.is_zero())
    }
}

fn parse_max_age(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        MemoError::InvalidArgument(format!(
            "max age must be a finite, non-negative number of seconds, got {secs}"
        ))
    })
}
