//! Reusable large transfer buffers.
//!
//! Relaying a big body through a small buffer costs many syscalls, allocating
//! a big one per request costs the allocator. [`BufferPool`] hands out fixed
//! 32 MiB buffers and takes them back for the next request.

use std::ops::{Deref, DerefMut};

use crossbeam_queue::ArrayQueue;
use tracing::debug;

/// Size of every buffer handed out by a [`BufferPool`] (32 MiB).
pub const BUFFER_SIZE: usize = 32 << 20;

/// Idle buffers retained by [`BufferPool::new`].
const DEFAULT_MAX_IDLE: usize = 16;

/// A lock-free pool of [`BUFFER_SIZE`] byte buffers.
///
/// There is no cap on checked-out buffers: when the pool is empty a fresh
/// buffer is allocated. Only idle buffers are bounded; returns beyond
/// `max_idle` are dropped. Safe to share across tasks behind an `Arc` or a
/// shared reference.
///
/// # Examples
///
/// ```
/// use outflow::pool::{BufferPool, BUFFER_SIZE};
///
/// let pool = BufferPool::new();
/// let buf = pool.get();
/// assert_eq!(buf.len(), BUFFER_SIZE);
/// pool.put(buf);
/// assert_eq!(pool.idle(), 1);
/// ```
#[derive(Debug)]
pub struct BufferPool {
    idle: ArrayQueue<Vec<u8>>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    /// Creates a pool that keeps at most `max_idle` returned buffers (minimum 1).
    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            idle: ArrayQueue::new(max_idle.max(1)),
        }
    }

    /// Takes a buffer of exactly [`BUFFER_SIZE`] bytes, allocating if none is idle.
    pub fn get(&self) -> Vec<u8> {
        self.idle.pop().unwrap_or_else(|| {
            debug!(size = BUFFER_SIZE, "allocating transfer buffer");
            vec![0; BUFFER_SIZE]
        })
    }

    /// Returns a buffer for reuse.
    ///
    /// Buffers whose length is not [`BUFFER_SIZE`] are dropped, so every later
    /// [`get`](Self::get) still sees the fixed size.
    pub fn put(&self, buf: Vec<u8>) {
        if buf.len() != BUFFER_SIZE {
            debug!(len = buf.len(), "discarding foreign buffer");
            return;
        }
        // A full queue means enough idle buffers already; let this one go.
        let _ = self.idle.push(buf);
    }

    /// Checks out a buffer that goes back to the pool when dropped.
    pub fn checkout(&self) -> PooledBuffer<'_> {
        PooledBuffer {
            pool: self,
            buf: Some(self.get()),
        }
    }

    /// Number of buffers currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.len()
    }
}

/// A buffer on loan from a [`BufferPool`].
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Option<Vec<u8>>,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put(buf);
        }
    }
}
