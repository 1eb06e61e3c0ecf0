//! Memo Module
//!
//! Wraps functions so their results are cached in a [`Store`], keyed by
//! their arguments.
//!
//! [`Store`]: crate::store::Store

mod asynchronous;
mod key;
mod shared;
mod stats;
mod sync;

pub use asynchronous::{ttl_cached_async, AsyncMemoized};
pub use key::{CacheArgs, KeyPath, KeyStrategy, Resolver, EMPTY_ARGS_KEY};
pub use stats::{CacheStats, MemoStats};
pub use sync::{ttl_cached, Memoized};
