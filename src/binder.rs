//! Method Binder
//!
//! Registration table that memoizes a set of named methods. Each method gets
//! its own store, and its bypass call is reachable under the method name
//! with a prefix (`_` by default), so `"load"` is cached and `"_load"`
//! always recomputes.
//!
//! Bound methods key both paths on their first argument.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use crate::config::StoreOptions;
use crate::error::{MemoError, Result};
use crate::memo::{AsyncMemoized, CacheArgs, Memoized};

// == Public Constants ==
/// Prefix under which bypass calls are registered unless overridden.
pub const DEFAULT_PREFIX: &str = "_";

/// Boxed future returned by an async bound method.
pub type BoxFuture<V> = Pin<Box<dyn Future<Output = V> + Send>>;

/// Sync method as stored in a [`MethodTable`].
pub type BoundMethod<A, V> = Memoized<A, V, Box<dyn Fn(A) -> V + Send + Sync>>;

/// Async method as stored in a [`MethodTable`].
pub type BoundAsyncMethod<A, V> =
    AsyncMemoized<A, V, Box<dyn Fn(A) -> BoxFuture<V> + Send + Sync>>;

// == Binding ==
/// What a name resolved to.
#[derive(Debug)]
pub enum Binding<'a, M> {
    /// The plain method name: memoized call
    Cached(&'a M),
    /// The prefixed name: bypass call
    Direct(&'a M),
}

// == Method Table ==
/// Named memoized methods, looked up by name.
#[derive(Debug)]
pub struct MethodTable<M> {
    methods: HashMap<String, M>,
    prefix: String,
}

impl<M> MethodTable<M> {
    /// Creates an empty table using [`DEFAULT_PREFIX`].
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Creates an empty table whose bypass names start with `prefix`.
    /// An empty prefix falls back to [`DEFAULT_PREFIX`].
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if prefix.is_empty() {
            prefix = DEFAULT_PREFIX.to_string();
        }
        Self {
            methods: HashMap::new(),
            prefix,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers an already wrapped method, returning any it replaced.
    ///
    /// A later registration under the same name replaces the earlier one,
    /// along with its store and counters.
    pub fn insert(&mut self, name: impl Into<String>, method: M) -> Option<M> {
        let name = name.into();
        debug!(method = %name, bypass = %self.direct_name(&name), "method bound");
        let replaced = self.methods.insert(name.clone(), method);
        if replaced.is_some() {
            warn!(method = %name, "method rebound, previous cache dropped");
        }
        replaced
    }

    /// The wrapper registered under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&M> {
        self.methods.get(name)
    }

    /// Name the bypass call for `name` is reachable under.
    pub fn direct_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Registered method names (without prefix).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    // == Resolve ==
    /// Looks `name` up. An exact match is the memoized method; otherwise a
    /// prefixed name selects the bypass call of the method it names.
    pub fn resolve(&self, name: &str) -> Result<Binding<'_, M>> {
        if let Some(method) = self.methods.get(name) {
            return Ok(Binding::Cached(method));
        }
        name.strip_prefix(self.prefix.as_str())
            .and_then(|base| self.methods.get(base))
            .map(Binding::Direct)
            .ok_or_else(|| {
                MemoError::InvalidArgument(format!("no cached method named `{name}`"))
            })
    }
}

impl<M> Default for MethodTable<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, V> MethodTable<BoundMethod<A, V>>
where
    A: CacheArgs,
    V: Clone + Send + 'static,
{
    // == Bind ==
    /// Memoizes `func` under `name` with its own store built from `options`.
    pub fn bind<F>(
        &mut self,
        name: impl Into<String>,
        options: StoreOptions,
        func: F,
    ) -> &mut Self
    where
        F: Fn(A) -> V + Send + Sync + 'static,
    {
        let func: Box<dyn Fn(A) -> V + Send + Sync> = Box::new(func);
        self.insert(name, Memoized::new(func, options).keyed_by_first_argument());
        self
    }

    // == Call ==
    /// Calls the method `name` resolves to: memoized for a plain name,
    /// bypass for a prefixed one.
    pub fn call(&self, name: &str, args: A) -> Result<V> {
        Ok(match self.resolve(name)? {
            Binding::Cached(method) => method.call(args),
            Binding::Direct(method) => method.direct(args),
        })
    }
}

impl<A, V> MethodTable<BoundAsyncMethod<A, V>>
where
    A: CacheArgs,
    V: Clone + Send + 'static,
{
    // == Bind Async ==
    /// Memoizes the async `func` under `name` with its own store.
    pub fn bind_async<F, Fut>(
        &mut self,
        name: impl Into<String>,
        options: StoreOptions,
        func: F,
    ) -> &mut Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        let func: Box<dyn Fn(A) -> BoxFuture<V> + Send + Sync> =
            Box::new(move |args: A| -> BoxFuture<V> { Box::pin(func(args)) });
        self.insert(name, AsyncMemoized::new(func, options).keyed_by_first_argument());
        self
    }

    // == Call Async ==
    /// Async counterpart of [`MethodTable::call`].
    pub async fn call_async(&self, name: &str, args: A) -> Result<V> {
        Ok(match self.resolve(name)? {
            Binding::Cached(method) => method.call(args).await,
            Binding::Direct(method) => method.direct(args).await,
        })
    }
}
