use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::properties::slot::{Buffer, DataSlot};

/// Pool configuration for cached byte buffers.
#[derive(Debug, Clone, Copy)]
pub struct BufferPoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained buffers per byte-length bucket.
    pub max_buffers_per_bucket: usize,
}

impl Default for BufferPoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 64 * 1024 * 1024,
            max_buffers_per_bucket: 8,
        }
    }
}

/// Allocation counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferPoolStats {
    /// Buffers currently parked in the pool.
    pub retained_buffers: usize,
    /// Bytes currently parked in the pool.
    pub retained_bytes: usize,
    /// Fresh allocations performed.
    pub alloc_buffers: u64,
    /// Bytes freshly allocated.
    pub alloc_bytes: u64,
    /// Allocations served from a bucket.
    pub reused_buffers: u64,
    /// Releases dropped because a cap was hit.
    pub dropped_on_release: u64,
}

struct PoolState {
    opts: BufferPoolOpts,
    stats: BufferPoolStats,
    buckets: HashMap<usize, Vec<Vec<u8>>>,
}

/// Bounded pool of byte buffers used for synthesized silence, waveform bitmaps and deep copies.
///
/// Keyed by exact byte length. The handle is cheap to clone and shares one pool.
#[derive(Clone)]
pub struct BufferPool {
    state: Arc<Mutex<PoolState>>,
}

impl BufferPool {
    /// Create a pool with explicit caps.
    pub fn new(opts: BufferPoolOpts) -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState {
                opts,
                stats: BufferPoolStats::default(),
                buckets: HashMap::new(),
            })),
        }
    }

    /// Process-wide pool shared by frames.
    pub fn global() -> BufferPool {
        static POOL: OnceLock<BufferPool> = OnceLock::new();
        POOL.get_or_init(|| BufferPool::new(BufferPoolOpts::default()))
            .clone()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> BufferPoolStats {
        self.state.lock().stats.clone()
    }

    /// Borrow a zero-filled buffer of exactly `len` bytes.
    pub fn alloc(&self, len: usize) -> Vec<u8> {
        let mut st = self.state.lock();
        if let Some(mut v) = st.buckets.get_mut(&len).and_then(Vec::pop) {
            st.stats.retained_buffers = st.stats.retained_buffers.saturating_sub(1);
            st.stats.retained_bytes = st.stats.retained_bytes.saturating_sub(len);
            st.stats.reused_buffers = st.stats.reused_buffers.saturating_add(1);
            drop(st);
            v.fill(0);
            return v;
        }
        st.stats.alloc_buffers = st.stats.alloc_buffers.saturating_add(1);
        st.stats.alloc_bytes = st.stats.alloc_bytes.saturating_add(len as u64);
        drop(st);
        vec![0; len]
    }

    /// Return a buffer for reuse. Dropped instead when a cap would be exceeded.
    pub fn release(&self, bytes: Vec<u8>) {
        let len = bytes.len();
        let mut guard = self.state.lock();
        let st = &mut *guard;
        if len == 0 || st.opts.max_pool_bytes == 0 || st.opts.max_buffers_per_bucket == 0 {
            st.stats.dropped_on_release = st.stats.dropped_on_release.saturating_add(1);
            return;
        }
        if st.stats.retained_bytes.saturating_add(len) > st.opts.max_pool_bytes {
            st.stats.dropped_on_release = st.stats.dropped_on_release.saturating_add(1);
            return;
        }
        let cap = st.opts.max_buffers_per_bucket;
        let bucket = st.buckets.entry(len).or_default();
        if bucket.len() >= cap {
            st.stats.dropped_on_release = st.stats.dropped_on_release.saturating_add(1);
            return;
        }
        bucket.push(bytes);
        st.stats.retained_buffers = st.stats.retained_buffers.saturating_add(1);
        st.stats.retained_bytes = st.stats.retained_bytes.saturating_add(len);
    }

    /// Wrap a buffer into an owning data slot that hands its bytes back to this pool on release.
    ///
    /// The bytes only return to the pool when no other [`Buffer`] handle still aliases them.
    pub fn slot_for(&self, buffer: Buffer) -> DataSlot {
        let size = buffer.len();
        let pool = self.clone();
        DataSlot::owned(
            buffer,
            size,
            Some(Box::new(move |buffer: Buffer| {
                if let Ok(bytes) = buffer.into_unique() {
                    pool.release(bytes);
                }
            })),
        )
    }
}

#[cfg(test)]
#[path = "../tests/unit/pool.rs"]
mod tests;
