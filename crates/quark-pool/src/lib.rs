//! Reusable-instance pools.
//!
//! Two flavours, matching the two threading contexts of the runtime:
//!
//! - [`Pool`] / [`SharedPool`]: sharded, lock-protected pools of [`Reuse`] values. Safe to use
//!   from IO completion threads; [`byte_pool`] is the process-wide byte buffer pool.
//! - [`ObjectPool`]: a single-threaded pool of arbitrary objects built by a factory closure and
//!   reset by a reset closure. Intended for tick-thread gameplay objects.
//!
//! ```
//! use quark_pool::{ObjectPool, Pool};
//!
//! let pool = Pool::<4, Vec<u8>>::new(16, 4096);
//! let mut buf = pool.get();
//! buf.extend_from_slice(b"bundle");
//! drop(buf); // back into the pool
//!
//! let mut bullets = ObjectPool::new(|| Vec::<u32>::with_capacity(8), Vec::clear);
//! let b = bullets.acquire();
//! bullets.release(b);
//! assert_eq!(bullets.idle_count(), 1);
//! ```

#![forbid(unsafe_code)]

mod global;
mod object;
mod pool;

pub use global::{BytePool, byte_pool};
pub use object::ObjectPool;
pub use pool::{Pool, Pooled, PooledOwned, Reuse, SharedPool};
