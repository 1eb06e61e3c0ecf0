//! Asynchronous memoization wrapper.
//!
//! The store is checked before the wrapped future is awaited and written
//! after it resolves. Concurrent calls for the same key that all miss each
//! run the function; whichever finishes last owns the entry.

use std::fmt;
use std::future::Future;

use tracing::debug;

use crate::config::StoreOptions;
use crate::memo::shared::MemoCore;
use crate::memo::{CacheArgs, CacheStats, KeyPath, KeyStrategy};
use crate::store::{Store, TtlStore};

// == Async Memoized ==
/// An async function bundled with the store that caches its results.
///
/// # Example
/// ```
/// use memocache::{AsyncMemoized, StoreOptions};
///
/// # tokio_test::block_on(async {
/// let lookup = AsyncMemoized::new(
///     |(id,): (u32,)| async move { format!("user-{id}") },
///     StoreOptions::default(),
/// );
/// assert_eq!(lookup.call((7,)).await, "user-7");
/// assert_eq!(lookup.call((7,)).await, "user-7");
/// assert_eq!(lookup.stats().hits, 1);
/// # });
/// ```
pub struct AsyncMemoized<A, V, F, S = TtlStore<V>> {
    func: F,
    core: MemoCore<A, V, S>,
}

impl<A, V, F> AsyncMemoized<A, V, F, TtlStore<V>>
where
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Wraps an infallible async function over a [`TtlStore`].
    pub fn new<Fut>(func: F, options: StoreOptions) -> Self
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = V>,
    {
        Self::with_store(func, options)
    }

    /// Wraps a fallible async function over a [`TtlStore`]. Only `Ok`
    /// values are cached.
    pub fn fallible<Fut, E>(func: F, options: StoreOptions) -> Self
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        Self::with_store(func, options)
    }
}

impl<A, V, F, S> AsyncMemoized<A, V, F, S>
where
    S: Store<V>,
{
    /// Wraps `func` over any store backend, built once from `options`.
    pub fn with_store(func: F, options: StoreOptions) -> Self {
        Self {
            func,
            core: MemoCore::new(&options),
        }
    }

    /// Derives keys with `resolver` on both the memoized and bypass paths.
    pub fn with_resolver(
        mut self,
        resolver: impl Fn(&A) -> String + Send + Sync + 'static,
    ) -> Self {
        self.core.keys = KeyStrategy::Resolver(Box::new(resolver));
        self
    }

    /// Keys both paths on the first argument alone.
    pub fn keyed_by_first_argument(mut self) -> Self {
        self.core.keys = KeyStrategy::FirstArgument;
        self
    }

    // == Accessors ==
    /// The store bound to this wrapper.
    pub fn cache(&self) -> &S {
        &self.core.store
    }

    /// The original, unwrapped function.
    pub fn func(&self) -> &F {
        &self.func
    }

    pub fn stats(&self) -> CacheStats {
        self.core.stats.snapshot()
    }
}

impl<A, V, F, S> AsyncMemoized<A, V, F, S>
where
    A: CacheArgs,
    V: Clone,
    S: Store<V>,
{
    // == Call ==
    /// Returns the cached result for `args`, awaiting the function and
    /// storing its output on a miss.
    pub async fn call<Fut>(&self, args: A) -> V
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = V>,
    {
        let Some(key) = self.core.key(&args, KeyPath::Memoized) else {
            return (self.func)(args).await;
        };
        if let Some(value) = self.core.lookup(&key) {
            return value;
        }

        let value = (self.func)(args).await;
        self.core.fill(key, &value);
        value
    }

    // == Direct ==
    /// Always awaits the function and overwrites the entry with the result.
    pub async fn direct<Fut>(&self, args: A) -> V
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = V>,
    {
        let Some(key) = self.core.key(&args, KeyPath::Direct) else {
            return (self.func)(args).await;
        };

        let value = (self.func)(args).await;
        self.core.refresh(key, &value);
        value
    }

    // == Try Call ==
    /// Like [`AsyncMemoized::call`] for fallible functions. An error is
    /// returned as-is and nothing is stored.
    pub async fn try_call<Fut, E>(&self, args: A) -> Result<V, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let Some(key) = self.core.key(&args, KeyPath::Memoized) else {
            return (self.func)(args).await;
        };
        if let Some(value) = self.core.lookup(&key) {
            return Ok(value);
        }

        match (self.func)(args).await {
            Ok(value) => {
                self.core.fill(key, &value);
                Ok(value)
            }
            Err(err) => {
                debug!(key = %key, "call failed, nothing cached");
                Err(err)
            }
        }
    }

    // == Try Direct ==
    /// Like [`AsyncMemoized::direct`] for fallible functions.
    pub async fn try_direct<Fut, E>(&self, args: A) -> Result<V, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let Some(key) = self.core.key(&args, KeyPath::Direct) else {
            return (self.func)(args).await;
        };

        let value = (self.func)(args).await?;
        self.core.refresh(key, &value);
        Ok(value)
    }
}

impl<A, V, F, S: fmt::Debug> fmt::Debug for AsyncMemoized<A, V, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncMemoized")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

/// Wraps an infallible async function over a [`TtlStore`] built from
/// `options`.
pub fn ttl_cached_async<A, V, F, Fut>(
    options: StoreOptions,
    func: F,
) -> AsyncMemoized<A, V, F>
where
    V: Clone + Send + 'static,
    F: Fn(A) -> Fut,
    Fut: Future<Output = V>,
{
    AsyncMemoized::new(func, options)
}
