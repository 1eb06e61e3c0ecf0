//! Error types for the memoization layer
//!
//! Provides unified error handling using thiserror. Errors raised by a
//! wrapped function are never converted into this type.

use thiserror::Error;

// == Memo Error Enum ==
/// Unified error type for stores, wrappers and the method table.
#[derive(Error, Debug)]
pub enum MemoError {
    /// An argument could not be accepted (bad option value, unknown method)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Call arguments could not be turned into a cache key
    #[error("Key serialization failed: {0}")]
    KeySerialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, MemoError>;
