use std::{
    fmt,
    hash::{Hash, Hasher},
    mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use parking_lot::Mutex;

/// Values that can be cleared and handed out again.
pub trait Reuse {
    /// Reset the value for its next user, shrinking retained capacity to `trim`.
    ///
    /// Returns `false` if the value is not worth keeping (it is dropped instead).
    fn reuse(&mut self, trim: usize) -> bool;
}

impl<T> Reuse for Vec<T> {
    fn reuse(&mut self, trim: usize) -> bool {
        self.clear();
        self.shrink_to(trim);
        self.capacity() > 0
    }
}

impl Reuse for String {
    fn reuse(&mut self, trim: usize) -> bool {
        self.clear();
        self.shrink_to(trim);
        self.capacity() > 0
    }
}

struct Shard<T> {
    idle: Vec<T>,
    max_idle: usize,
}

impl<T: Reuse> Shard<T> {
    fn take(&mut self) -> Option<T> {
        self.idle.pop()
    }

    fn give(&mut self, mut value: T, trim: usize) {
        if self.idle.len() < self.max_idle && value.reuse(trim) {
            self.idle.push(value);
        }
    }
}

/// Sharded pool of [`Reuse`] values.
///
/// Each thread maps to a home shard by thread id; `get` falls back to the other shards before
/// allocating a fresh `T::default()`.
pub struct Pool<const SHARDS: usize, T: Reuse> {
    shards: [Mutex<Shard<T>>; SHARDS],
    trim_capacity: usize,
}

impl<const SHARDS: usize, T: Reuse + Default> Pool<SHARDS, T> {
    /// # Panics
    ///
    /// Panics if `SHARDS` is zero.
    #[must_use]
    pub fn new(max_idle: usize, trim_capacity: usize) -> Self {
        assert!(SHARDS > 0, "Pool needs at least one shard");
        let per_shard = (max_idle / SHARDS).max(1);
        Self {
            shards: std::array::from_fn(|_| {
                Mutex::new(Shard {
                    idle: Vec::new(),
                    max_idle: per_shard,
                })
            }),
            trim_capacity,
        }
    }

    pub fn get(&self) -> Pooled<'_, SHARDS, T> {
        self.get_with(|_| {})
    }

    pub fn get_with<F: FnOnce(&mut T)>(&self, init: F) -> Pooled<'_, SHARDS, T> {
        let (mut value, shard) = self.take_any();
        init(&mut value);
        Pooled {
            value,
            pool: self,
            shard,
        }
    }

    fn take_any(&self) -> (T, usize) {
        let home = self.shard_index();
        for offset in 0..SHARDS {
            let idx = (home + offset) % SHARDS;
            if let Some(v) = self.shards[idx].lock().take() {
                return (v, home);
            }
        }
        (T::default(), home)
    }
}

impl<const SHARDS: usize, T: Reuse> Pool<SHARDS, T> {
    pub(crate) fn shard_index(&self) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::thread::current().id().hash(&mut hasher);
        usize::try_from(hasher.finish() % SHARDS as u64).unwrap_or(0)
    }

    pub(crate) fn put(&self, value: T, shard: usize) {
        self.shards[shard % SHARDS]
            .lock()
            .give(value, self.trim_capacity);
    }

    /// Hand a value obtained elsewhere to the pool.
    pub fn recycle(&self, value: T) {
        self.put(value, self.shard_index());
    }

    /// Idle values currently held across all shards.
    pub fn idle_count(&self) -> usize {
        self.shards.iter().map(|s| s.lock().idle.len()).sum()
    }
}

/// Borrowed guard; returns its value to the pool on drop.
pub struct Pooled<'a, const SHARDS: usize, T: Reuse + Default> {
    value: T,
    pool: &'a Pool<SHARDS, T>,
    shard: usize,
}

impl<const SHARDS: usize, T: Reuse + Default> Pooled<'_, SHARDS, T> {
    /// Keep the value; an empty default goes back in its place and is discarded.
    pub fn into_inner(mut self) -> T {
        mem::take(&mut self.value)
    }
}

impl<const SHARDS: usize, T: Reuse + Default> Drop for Pooled<'_, SHARDS, T> {
    fn drop(&mut self) {
        self.pool.put(mem::take(&mut self.value), self.shard);
    }
}

impl<const SHARDS: usize, T: Reuse + Default> Deref for Pooled<'_, SHARDS, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<const SHARDS: usize, T: Reuse + Default> DerefMut for Pooled<'_, SHARDS, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// `Arc`-backed pool handle producing `'static` guards.
pub struct SharedPool<const SHARDS: usize, T: Reuse>(Arc<Pool<SHARDS, T>>);

impl<const SHARDS: usize, T: Reuse + Default> SharedPool<SHARDS, T> {
    #[must_use]
    pub fn new(max_idle: usize, trim_capacity: usize) -> Self {
        Self(Arc::new(Pool::new(max_idle, trim_capacity)))
    }

    pub fn get(&self) -> PooledOwned<SHARDS, T> {
        self.get_with(|_| {})
    }

    pub fn get_with<F: FnOnce(&mut T)>(&self, init: F) -> PooledOwned<SHARDS, T> {
        let (mut value, shard) = self.0.take_any();
        init(&mut value);
        PooledOwned {
            value,
            pool: Arc::clone(&self.0),
            shard,
        }
    }

    pub fn recycle(&self, value: T) {
        self.0.recycle(value);
    }

    pub fn idle_count(&self) -> usize {
        self.0.idle_count()
    }
}

impl<const SHARDS: usize, T: Reuse> Clone for SharedPool<SHARDS, T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<const SHARDS: usize, T: Reuse> fmt::Debug for SharedPool<SHARDS, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPool")
            .field("shards", &SHARDS)
            .finish_non_exhaustive()
    }
}

/// Owned guard holding an `Arc` to its pool.
pub struct PooledOwned<const SHARDS: usize, T: Reuse + Default> {
    value: T,
    pool: Arc<Pool<SHARDS, T>>,
    shard: usize,
}

impl<const SHARDS: usize, T: Reuse + Default> PooledOwned<SHARDS, T> {
    pub fn into_inner(mut self) -> T {
        mem::take(&mut self.value)
    }
}

impl<const SHARDS: usize, T: Reuse + Default> Drop for PooledOwned<SHARDS, T> {
    fn drop(&mut self) {
        self.pool.put(mem::take(&mut self.value), self.shard);
    }
}

impl<const SHARDS: usize, T: Reuse + Default> Deref for PooledOwned<SHARDS, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<const SHARDS: usize, T: Reuse + Default> DerefMut for PooledOwned<SHARDS, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<const SHARDS: usize, T: Reuse + Default + fmt::Debug> fmt::Debug for PooledOwned<SHARDS, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}
