//! Synchronous memoization wrapper.

use std::fmt;

use tracing::debug;

use crate::config::StoreOptions;
use crate::memo::shared::MemoCore;
use crate::memo::{CacheArgs, CacheStats, KeyPath, KeyStrategy};
use crate::store::{Store, TtlStore};

// == Memoized ==
/// A function bundled with the store that caches its results.
///
/// Arguments are passed as one tuple, so a two-argument function is called
/// as `memo.call((a, b))`. Use [`Memoized::call`] / [`Memoized::direct`]
/// for functions that return a plain value and [`Memoized::try_call`] /
/// [`Memoized::try_direct`] for functions returning `Result`, whose errors
/// are handed back untouched and never stored.
///
/// # Example
/// ```
/// use memocache::{Memoized, StoreOptions};
///
/// let double = Memoized::new(|(x,): (i32,)| x * 2, StoreOptions::default());
/// assert_eq!(double.call((3,)), 6);
/// assert_eq!(double.call((3,)), 6);
/// assert_eq!(double.stats().hits, 1);
/// ```
pub struct Memoized<A, V, F, S = TtlStore<V>> {
    func: F,
    core: MemoCore<A, V, S>,
}

impl<A, V, F> Memoized<A, V, F, TtlStore<V>>
where
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Wraps an infallible function over a [`TtlStore`].
    pub fn new(func: F, options: StoreOptions) -> Self
    where
        F: Fn(A) -> V,
    {
        Self::with_store(func, options)
    }

    /// Wraps a fallible function over a [`TtlStore`]. Only `Ok` values are
    /// cached.
    pub fn fallible<E>(func: F, options: StoreOptions) -> Self
    where
        F: Fn(A) -> Result<V, E>,
    {
        Self::with_store(func, options)
    }
}

impl<A, V, F, S> Memoized<A, V, F, S>
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

impl<A, V, F, S> Memoized<A, V, F, S>
where
    A: CacheArgs,
    V: Clone,
    S: Store<V>,
{
    // == Call ==
    /// Returns the cached result for `args`, computing and storing it on a
    /// miss.
    pub fn call(&self, args: A) -> V
    where
        F: Fn(A) -> V,
    {
        let Some(key) = self.core.key(&args, KeyPath::Memoized) else {
            return (self.func)(args);
        };
        if let Some(value) = self.core.lookup(&key) {
            return value;
        }

        let value = (self.func)(args);
        self.core.fill(key, &value);
        value
    }

    // == Direct ==
    /// Always invokes the function and overwrites the entry with the result.
    pub fn direct(&self, args: A) -> V
    where
        F: Fn(A) -> V,
    {
        let Some(key) = self.core.key(&args, KeyPath::Direct) else {
            return (self.func)(args);
        };

        let value = (self.func)(args);
        self.core.refresh(key, &value);
        value
    }

    // == Try Call ==
    /// Like [`Memoized::call`] for fallible functions. An error is returned
    /// as-is and leaves the store untouched.
    pub fn try_call<E>(&self, args: A) -> Result<V, E>
    where
        F: Fn(A) -> Result<V, E>,
    {
        let Some(key) = self.core.key(&args, KeyPath::Memoized) else {
            return (self.func)(args);
        };
        if let Some(value) = self.core.lookup(&key) {
            return Ok(value);
        }

        match (self.func)(args) {
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
    /// Like [`Memoized::direct`] for fallible functions. On error the
    /// existing entry is left as it was.
    pub fn try_direct<E>(&self, args: A) -> Result<V, E>
    where
        F: Fn(A) -> Result<V, E>,
    {
        let Some(key) = self.core.key(&args, KeyPath::Direct) else {
            return (self.func)(args);
        };

        let value = (self.func)(args)?;
        self.core.refresh(key, &value);
        Ok(value)
    }
}

impl<A, V, F, S: fmt::Debug> fmt::Debug for Memoized<A, V, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

/// Wraps an infallible function over a [`TtlStore`] built from `options`.
pub fn ttl_cached<A, V, F>(options: StoreOptions, func: F) -> Memoized<A, V, F>
where
    V: Clone + Send + 'static,
    F: Fn(A) -> V,
{
    Memoized::new(func, options)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Map-backed store that records every operation it receives.
    #[derive(Debug, Default)]
    struct RecordingStore {
        entries: RefCell<HashMap<String, i32>>,
        log: RefCell<Vec<String>>,
    }

    impl Store<i32> for RecordingStore {
        fn from_options(_options: &StoreOptions) -> Self {
            Self::default()
        }

        fn has(&self, key: &str) -> bool {
            self.log.borrow_mut().push(format!("has {key}"));
            self.entries.borrow().contains_key(key)
        }

        fn get(&self, key: &str) -> Option<i32> {
            self.log.borrow_mut().push(format!("get {key}"));
            self.entries.borrow().get(key).copied()
        }

        fn set(&self, key: String, value: i32) {
            self.log.borrow_mut().push(format!("set {key}"));
            self.entries.borrow_mut().insert(key, value);
        }

        fn delete(&self, key: &str) {
            self.entries.borrow_mut().remove(key);
        }

        fn clear(&self) {
            self.entries.borrow_mut().clear();
        }

        fn stop(&self) {
            self.clear();
        }
    }

    #[test]
    fn test_call_invokes_function_once() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(
            |(x,): (i32,)| {
                calls.fetch_add(1, Ordering::SeqCst);
                x * 2
            },
            StoreOptions::default(),
        );

        assert_eq!(memo.call((3,)), 6);
        assert_eq!(memo.call((3,)), 6);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.cache().get("[3]"), Some(6));
    }

    #[test]
    fn test_distinct_args_are_distinct_entries() {
        let memo = Memoized::new(|(x, y): (i32, i32)| x + y, StoreOptions::default());

        assert_eq!(memo.call((1, 2)), 3);
        assert_eq!(memo.call((2, 1)), 3);
        assert_eq!(memo.cache().len(), 2);
        assert_eq!(memo.stats().misses, 2);
    }

    #[test]
    fn test_empty_args_share_sentinel_key() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(
            |()| calls.fetch_add(1, Ordering::SeqCst),
            StoreOptions::default(),
        );

        assert_eq!(memo.call(()), 0);
        assert_eq!(memo.call(()), 0);
        assert!(memo.cache().has(crate::memo::EMPTY_ARGS_KEY));
    }

    #[test]
    fn test_direct_without_args_refreshes_memoized_entry() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(
            |()| calls.fetch_add(1, Ordering::SeqCst),
            StoreOptions::default(),
        );

        assert_eq!(memo.call(()), 0);
        assert_eq!(memo.direct(()), 1);
        assert_eq!(memo.call(()), 1);
        assert_eq!(memo.cache().len(), 1);
    }

    #[test]
    fn test_hit_skips_function_entirely() {
        let memo: Memoized<(i32,), i32, _, RecordingStore> =
            Memoized::with_store(|(x,): (i32,)| x + 1, StoreOptions::default());

        memo.call((1,));
        memo.call((1,));

        let log = memo.cache().log.borrow().clone();
        assert_eq!(log, vec!["has [1]", "set [1]", "has [1]", "get [1]"]);
    }

    #[test]
    fn test_resolver_controls_key() {
        let memo = Memoized::new(
            |(name, _attempt): (String, u32)| name.len(),
            StoreOptions::default(),
        )
        .with_resolver(|(name, _)| format!("user:{name}"));

        assert_eq!(memo.call(("ada".to_string(), 1)), 3);
        assert_eq!(memo.call(("ada".to_string(), 2)), 3);
        assert_eq!(memo.stats().hits, 1);
        assert!(memo.cache().has("user:ada"));
    }

    #[test]
    fn test_direct_always_recomputes() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(
            |(x,): (i32,)| x + calls.fetch_add(1, Ordering::SeqCst) as i32,
            StoreOptions::default(),
        );

        assert_eq!(memo.call((10,)), 10);
        assert_eq!(memo.direct((10,)), 11);
        assert_eq!(memo.direct((10,)), 12);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(memo.stats().refreshes, 2);
    }

    #[test]
    fn test_direct_uses_first_argument_key_by_default() {
        let memo = Memoized::new(|(x,): (i32,)| x * 2, StoreOptions::default());

        memo.direct((4,));

        // Bypass path keys on "4", memoized path on "[4]".
        assert_eq!(memo.cache().get("4"), Some(8));
        assert!(!memo.cache().has("[4]"));
    }

    #[test]
    fn test_direct_with_resolver_refreshes_memoized_entry() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(
            |(x,): (i32,)| x + calls.fetch_add(1, Ordering::SeqCst) as i32,
            StoreOptions::default(),
        )
        .with_resolver(|(x,)| x.to_string());

        assert_eq!(memo.call((1,)), 1);
        assert_eq!(memo.direct((1,)), 2);
        assert_eq!(memo.call((1,)), 2);
        assert_eq!(memo.cache().get("1"), Some(2));
    }

    #[test]
    fn test_keyed_by_first_argument() {
        let memo = Memoized::new(|(id, _page): (&str, u32)| id.len(), StoreOptions::default())
            .keyed_by_first_argument();

        memo.call(("abc", 1));
        memo.call(("abc", 2));
        assert_eq!(memo.stats().hits, 1);
        assert!(memo.cache().has("abc"));
    }

    #[test]
    fn test_try_call_does_not_cache_errors() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::fallible(
            |(x,): (i32,)| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("first attempt fails")
                } else {
                    Ok(x)
                }
            },
            StoreOptions::default(),
        );

        assert_eq!(memo.try_call((7,)), Err("first attempt fails"));
        assert!(memo.cache().is_empty());
        assert_eq!(memo.try_call((7,)), Ok(7));
        assert_eq!(memo.try_call((7,)), Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_try_direct_keeps_old_entry_on_error() {
        let fail = AtomicUsize::new(0);
        let memo = Memoized::fallible(
            |(x,): (i32,)| {
                if fail.load(Ordering::SeqCst) == 1 {
                    Err(x)
                } else {
                    Ok(x * 10)
                }
            },
            StoreOptions::default(),
        )
        .keyed_by_first_argument();

        assert_eq!(memo.try_call((2,)), Ok(20));
        fail.store(1, Ordering::SeqCst);
        assert_eq!(memo.try_direct((2,)), Err(2));
        assert_eq!(memo.cache().get("2"), Some(20));
    }

    #[test]
    fn test_unkeyable_args_pass_through() {
        let memo = Memoized::new(
            |(map,): (HashMap<(u8, u8), u8>,)| map.len(),
            StoreOptions::default(),
        );
        let mut map = HashMap::new();
        map.insert((1, 1), 1);

        assert_eq!(memo.call((map.clone(),)), 1);
        assert_eq!(memo.call((map,)), 1);
        assert!(memo.cache().is_empty());
        assert_eq!(memo.stats().passthroughs, 2);
    }

    #[test]
    fn test_func_accessor_is_original() {
        let memo = Memoized::new(|(x,): (i32,)| x - 1, StoreOptions::default());

        assert_eq!((memo.func())((5,)), 4);
        assert!(memo.cache().is_empty());
    }

    #[test]
    fn test_ttl_cached_helper() {
        let memo = ttl_cached(StoreOptions::default(), |(s,): (&str,)| s.to_uppercase());
        assert_eq!(memo.call(("hi",)), "HI");
        assert_eq!(memo.cache().options().max_age, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_recomputed_after_expiry() {
        let calls = AtomicUsize::new(0);
        let memo = Memoized::new(
            |(x,): (i32,)| {
                calls.fetch_add(1, Ordering::SeqCst);
                x
            },
            StoreOptions::with_max_age(Duration::from_secs(1)),
        );

        memo.call((1,));
        memo.call((1,));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        memo.call((1,));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
