use std::sync::OnceLock;

use crate::pool::SharedPool;

/// Byte buffer pool shared by fetchers and archive codecs.
pub type BytePool = SharedPool<16, Vec<u8>>;

// 16 shards, 256 idle buffers, trimmed to 256 KiB on return.
static GLOBAL_BYTE_POOL: OnceLock<BytePool> = OnceLock::new();

/// Process-wide byte buffer pool, created on first use.
pub fn byte_pool() -> &'static BytePool {
    GLOBAL_BYTE_POOL.get_or_init(|| BytePool::new(256, 256 * 1024))
}
