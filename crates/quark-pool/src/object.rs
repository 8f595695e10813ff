use std::fmt;

use tracing::trace;

/// Default upper bound on idle objects kept by an [`ObjectPool`].
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Single-threaded pool of reusable objects.
///
/// Objects come from `factory` when the pool is empty and pass through `reset` when released.
/// Releases beyond `max_idle` drop the object.
pub struct ObjectPool<T> {
    idle: Vec<T>,
    factory: Box<dyn FnMut() -> T>,
    reset: Box<dyn FnMut(&mut T)>,
    max_idle: usize,
    created: usize,
}

impl<T> ObjectPool<T> {
    pub fn new<F, R>(factory: F, reset: R) -> Self
    where
        F: FnMut() -> T + 'static,
        R: FnMut(&mut T) + 'static,
    {
        Self {
            idle: Vec::new(),
            factory: Box::new(factory),
            reset: Box::new(reset),
            max_idle: DEFAULT_MAX_IDLE,
            created: 0,
        }
    }

    #[must_use]
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self.idle.truncate(max_idle);
        self
    }

    /// Fill the pool up to `count` idle objects ahead of time.
    pub fn prewarm(&mut self, count: usize) {
        let target = count.min(self.max_idle);
        while self.idle.len() < target {
            let obj = (self.factory)();
            self.created += 1;
            self.idle.push(obj);
        }
    }

    pub fn acquire(&mut self) -> T {
        if let Some(obj) = self.idle.pop() {
            return obj;
        }
        self.created += 1;
        trace!(created = self.created, "ObjectPool: allocating");
        (self.factory)()
    }

    pub fn release(&mut self, mut obj: T) {
        if self.idle.len() >= self.max_idle {
            return;
        }
        (self.reset)(&mut obj);
        self.idle.push(obj);
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Objects ever produced by the factory.
    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn clear(&mut self) {
        self.idle.clear();
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("idle", &self.idle.len())
            .field("created", &self.created)
            .field("max_idle", &self.max_idle)
            .finish()
    }
}
