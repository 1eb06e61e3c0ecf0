//! Cache Key Module
//!
//! Turns call arguments into cache keys.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

// == Public Constants ==
/// Key used when a call has no arguments.
pub const EMPTY_ARGS_KEY: &str = "null";

/// Caller-supplied key function.
pub type Resolver<A> = Box<dyn Fn(&A) -> String + Send + Sync>;

// == Cache Args ==
/// Argument lists a memoized function can be called with.
///
/// Implemented for `()` and for tuples of up to eight `Serialize` values.
/// Implement it by hand for argument types that need a different key.
pub trait CacheArgs {
    /// Key for a memoized call: the whole argument list as a JSON array,
    /// e.g. `(3, "x")` becomes `[3,"x"]`.
    fn cache_key(&self) -> Result<String>;

    /// Key for a bypass call: the first argument alone. A string argument
    /// is used verbatim, anything else as its JSON text. With no arguments
    /// this is [`EMPTY_ARGS_KEY`], the same key the memoized path uses, so
    /// a bypass call refreshes that entry.
    fn first_key(&self) -> Result<String>;
}

impl CacheArgs for () {
    fn cache_key(&self) -> Result<String> {
        Ok(EMPTY_ARGS_KEY.to_string())
    }

    fn first_key(&self) -> Result<String> {
        Ok(EMPTY_ARGS_KEY.to_string())
    }
}

macro_rules! impl_cache_args {
    ($($arg:ident),+) => {
        impl<$($arg: Serialize),+> CacheArgs for ($($arg,)+) {
            fn cache_key(&self) -> Result<String> {
                Ok(serde_json::to_string(self)?)
            }

            fn first_key(&self) -> Result<String> {
                argument_key(&self.0)
            }
        }
    };
}

impl_cache_args!(A1);
impl_cache_args!(A1, A2);
impl_cache_args!(A1, A2, A3);
impl_cache_args!(A1, A2, A3, A4);
impl_cache_args!(A1, A2, A3, A4, A5);
impl_cache_args!(A1, A2, A3, A4, A5, A6);
impl_cache_args!(A1, A2, A3, A4, A5, A6, A7);
impl_cache_args!(A1, A2, A3, A4, A5, A6, A7, A8);

fn argument_key<T: Serialize>(argument: &T) -> Result<String> {
    Ok(match serde_json::to_value(argument)? {
        Value::String(text) => text,
        other => other.to_string(),
    })
}

// == Key Strategy ==
/// Which call path a key is being derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPath {
    Memoized,
    Direct,
}

/// How a wrapper derives keys from arguments.
pub enum KeyStrategy<A> {
    /// Whole argument list for memoized calls, first argument for bypass
    /// calls.
    Arguments,
    /// First argument on both paths.
    FirstArgument,
    /// Caller-supplied function on both paths.
    Resolver(Resolver<A>),
}

impl<A: CacheArgs> KeyStrategy<A> {
    /// Derives the key for `args` on the given path.
    pub fn key(&self, args: &A, path: KeyPath) -> Result<String> {
        match (self, path) {
            (KeyStrategy::Resolver(resolver), _) => Ok(resolver(args)),
            (KeyStrategy::FirstArgument, _) | (KeyStrategy::Arguments, KeyPath::Direct) => {
                args.first_key()
            }
            (KeyStrategy::Arguments, KeyPath::Memoized) => args.cache_key(),
        }
    }
}

impl<A> fmt::Debug for KeyStrategy<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStrategy::Arguments => f.write_str("Arguments"),
            KeyStrategy::FirstArgument => f.write_str("FirstArgument"),
            KeyStrategy::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}
