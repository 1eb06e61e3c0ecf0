//! Memocache - function memoization over pluggable stores
//!
//! Wraps sync or async functions so their results are cached under a key
//! derived from the call arguments. The shipped store expires every entry
//! a fixed time after it was written.

pub mod binder;
pub mod config;
pub mod error;
pub mod memo;
pub mod store;

pub use binder::MethodTable;
pub use config::StoreOptions;
pub use error::{MemoError, Result};
pub use memo::{ttl_cached, ttl_cached_async, AsyncMemoized, CacheArgs, CacheStats, Memoized};
pub use store::{Store, TtlStore};
