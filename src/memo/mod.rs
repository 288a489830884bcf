// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Memoization of pure functions of floating-point arguments.
//!
//! Interaction models evaluate the same differential cross sections over and
//! over for the same energy grid, from every worker thread at once. The caches
//! here store each result the first time it is asked for.
//!
//! Keys are the exact bit patterns of the arguments (with `-0.0` folded into
//! `0.0`); callers always pass values taken from an energy grid, so there is no
//! need for fuzzy matching. All caches may be shared between threads. Two
//! threads missing on the same key may both compute the value, but only one
//! value is ever stored, and it is the one both threads return.


use std::{
    hash::Hash,
    sync::atomic::{AtomicUsize, Ordering},
};

use dashmap::DashMap;

/// Hit and miss counts of a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

fn key_bits(x: f64) -> u64 {
    if x == 0.0 {
        0
    } else {
        x.to_bits()
    }
}

/// The storage shared by every cache variant.
struct Store<K, V> {
    values: DashMap<K, V>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<K: Hash + Eq, V: Copy> Store<K, V> {
    fn new() -> Self {
        Store {
            values: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    fn get_or_compute<F: FnOnce() -> V>(&self, key: K, compute: F) -> V {
        if let Some(v) = self.values.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return *v;
        }

        // Don't hold a shard lock while computing; the function may be slow
        // and may itself consult another cache.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let v = compute();
        *self.values.entry(key).or_insert(v)
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn clear(&self) {
        self.values.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

type Fn2<V> = Box<dyn Fn(f64, f64) -> V + Send + Sync>;
type Fn3<V> = Box<dyn Fn(f64, f64, f64) -> V + Send + Sync>;
type FnIndexed<V> = Box<dyn Fn(usize, usize, f64) -> V + Send + Sync>;

/// Memoizes a function of two arguments.
pub struct FunctionCache2<V> {
    f: Fn2<V>,
    store: Store<[u64; 2], V>,
}

impl<V: Copy> FunctionCache2<V> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64, f64) -> V + Send + Sync + 'static,
    {
        FunctionCache2 {
            f: Box::new(f),
            store: Store::new(),
        }
    }

    /// Bind a different function. Everything stored so far is discarded.
    pub fn set_function<F>(&mut self, f: F)
    where
        F: Fn(f64, f64) -> V + Send + Sync + 'static,
    {
        self.f = Box::new(f);
        self.store.clear();
    }

    pub fn get_value(&self, a: f64, b: f64) -> V {
        self.store
            .get_or_compute([key_bits(a), key_bits(b)], || (self.f)(a, b))
    }

    /// Get the size of the cache.
    pub fn len(&self) -> usize {
        self.store.values.len()
    }

    /// Is the cache empty?
    pub fn is_empty(&self) -> bool {
        self.store.values.is_empty()
    }

    /// Clear the cache.
    pub fn clear(&self) {
        self.store.clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}

/// Memoizes a function of three arguments.
pub struct FunctionCache3<V> {
    f: Fn3<V>,
    store: Store<[u64; 3], V>,
}

impl<V: Copy> FunctionCache3<V> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64, f64, f64) -> V + Send + Sync + 'static,
    {
        FunctionCache3 {
            f: Box::new(f),
            store: Store::new(),
        }
    }

    /// Bind a different function. Everything stored so far is discarded.
    pub fn set_function<F>(&mut self, f: F)
    where
        F: Fn(f64, f64, f64) -> V + Send + Sync + 'static,
    {
        self.f = Box::new(f);
        self.store.clear();
    }

    pub fn get_value(&self, a: f64, b: f64, c: f64) -> V {
        self.store
            .get_or_compute([key_bits(a), key_bits(b), key_bits(c)], || {
                (self.f)(a, b, c)
            })
    }

    pub fn len(&self) -> usize {
        self.store.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.values.is_empty()
    }

    pub fn clear(&self) {
        self.store.clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}

/// Memoizes a function of two grid indices and an energy, keyed on the
/// indices only. This suits kernels tabulated over two fixed energy axes for a
/// single skymap energy; [`IndexedFunctionCache::clear`] must be called when
/// that energy changes.
pub struct IndexedFunctionCache<V> {
    f: FnIndexed<V>,
    store: Store<(usize, usize), V>,
}

impl<V: Copy> IndexedFunctionCache<V> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(usize, usize, f64) -> V + Send + Sync + 'static,
    {
        IndexedFunctionCache {
            f: Box::new(f),
            store: Store::new(),
        }
    }

    /// Bind a different function. Everything stored so far is discarded.
    pub fn set_function<F>(&mut self, f: F)
    where
        F: Fn(usize, usize, f64) -> V + Send + Sync + 'static,
    {
        self.f = Box::new(f);
        self.store.clear();
    }

    pub fn get_value(&self, i: usize, j: usize, energy: f64) -> V {
        self.store.get_or_compute((i, j), || (self.f)(i, j, energy))
    }

    pub fn len(&self) -> usize {
        self.store.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.values.is_empty()
    }

    pub fn clear(&self) {
        self.store.clear()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}

macro_rules! impl_debug {
    ($ty:ident) => {
        impl<V> std::fmt::Debug for $ty<V> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("len", &self.store.values.len())
                    .finish_non_exhaustive()
            }
        }
    };
}

impl_debug!(FunctionCache2);
impl_debug!(FunctionCache3);
impl_debug!(IndexedFunctionCache);
