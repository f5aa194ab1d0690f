//! Thread-Safe Buffer Pool
//!
//! This module keeps a fixed number of pre-built [`Buffer`]s on a LIFO free
//! list so request handlers can borrow one, fill it and hand it back without
//! paying for the static region again.
//!
//! # Performance-First Design:
//! - LIFO reuse: the most recently released (cache-warm) buffer goes out first
//! - The lock covers only the slot table; buffers are reset before the lock
//!   is taken and overflow buffers are built and destroyed outside it
//! - Released buffers shed their dynamic region, so every idle buffer is
//!   uniform and no size matching is needed
//! - Per-acquisition dynamic allocator, e.g. an arena scoped to one request

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::alloc::SharedAllocator;
use crate::buffer::Buffer;
use crate::error::Result;

/// Default static size of pooled buffers.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Default number of pooled buffers.
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Construction parameters for a [`Pool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of buffers kept idle at most (and built up front).
    pub capacity: usize,
    /// Static region size of every pooled buffer.
    pub buffer_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Runtime statistics for a [`Pool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Size of the slot table.
    pub capacity: usize,
    /// Buffers currently idle in the pool.
    pub available: usize,
    /// Buffers built by the pool, up front and on overflow.
    pub created: u64,
    /// Acquisitions served from the free list.
    pub reused: u64,
    /// Acquisitions that found the pool empty and built a new buffer.
    pub overflow_created: u64,
    /// Releases destroyed because the slot table was full or the buffer's
    /// static size did not match.
    pub discarded: u64,
}

#[derive(Default)]
struct PoolMetrics {
    created: AtomicU64,
    reused: AtomicU64,
    overflow_created: AtomicU64,
    discarded: AtomicU64,
}

/// A pool of reusable [`Buffer`]s shared between threads.
///
/// A checked-out buffer belongs to its caller alone until it is passed back
/// to [`release`](Self::release). Dropping the pool drops the idle buffers
/// only; buffers still checked out are not tracked and stay valid, owned by
/// whoever holds them.
///
/// # Performance Pattern: Request-Scoped Buffers
/// ```rust
/// # use dualbuf_core::{alloc, Pool};
/// let pool = Pool::new(alloc::system(), 4, 256).unwrap();
/// let mut buf = pool.acquire().unwrap();
/// let mut prefix = buf.skip(4).unwrap();
/// buf.write(b"frame").unwrap();
/// prefix.write_u32(&mut buf, 5);
/// assert_eq!(buf.as_bytes(), b"\0\0\0\x05frame");
/// pool.release(buf);
/// ```
pub struct Pool {
    /// Primary allocator of every pooled buffer.
    allocator: SharedAllocator,
    buffer_size: usize,
    capacity: usize,
    /// Idle buffers; the top of the stack is the most recently released.
    slots: Mutex<Vec<Box<Buffer>>>,
    metrics: PoolMetrics,
}

impl Pool {
    /// Build `capacity` buffers with `buffer_size`-byte static regions.
    ///
    /// If any of them cannot be allocated the ones already built are freed
    /// and the error is returned.
    pub fn new(allocator: SharedAllocator, capacity: usize, buffer_size: usize) -> Result<Self> {
        info!(capacity, buffer_size, "Creating buffer Pool");
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Box::new(Buffer::new(allocator.clone(), buffer_size)?));
        }
        let metrics = PoolMetrics::default();
        metrics.created.store(capacity as u64, Ordering::Relaxed);
        Ok(Self {
            allocator,
            buffer_size,
            capacity,
            slots: Mutex::new(slots),
            metrics,
        })
    }

    /// Build a pool from a [`PoolConfig`].
    pub fn from_config(allocator: SharedAllocator, config: &PoolConfig) -> Result<Self> {
        Self::new(allocator, config.capacity, config.buffer_size)
    }

    /// Size of the slot table.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Static size of pooled buffers.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Primary allocator of pooled buffers.
    pub fn allocator(&self) -> &SharedAllocator {
        &self.allocator
    }

    /// Number of idle buffers.
    pub fn available(&self) -> usize {
        self.slots.lock().len()
    }

    /// Borrow a buffer that grows through the pool's own allocator.
    pub fn acquire(&self) -> Result<Box<Buffer>> {
        self.acquire_with_allocator(self.allocator.clone())
    }

    /// Borrow a buffer whose dynamic growth uses `allocator`.
    ///
    /// Pops the most recently released buffer. When the pool is empty a new
    /// buffer is built outside the lock; it is not tracked by the pool and
    /// is only kept on release if a slot is free. Fails only when that
    /// construction fails.
    pub fn acquire_with_allocator(&self, allocator: SharedAllocator) -> Result<Box<Buffer>> {
        let idle = self.slots.lock().pop();
        let mut buffer = match idle {
            Some(buffer) => {
                self.metrics.reused.fetch_add(1, Ordering::Relaxed);
                trace!("Reusing pooled buffer");
                buffer
            }
            None => {
                debug!(buffer_size = self.buffer_size, "Pool exhausted – allocating new buffer");
                let buffer = Box::new(Buffer::new(self.allocator.clone(), self.buffer_size)?);
                self.metrics.created.fetch_add(1, Ordering::Relaxed);
                self.metrics.overflow_created.fetch_add(1, Ordering::Relaxed);
                buffer
            }
        };
        buffer.set_dynamic_allocator(Some(allocator));
        Ok(buffer)
    }

    /// Return a buffer to the pool.
    ///
    /// The buffer is reset (dynamic region freed, dynamic allocator cleared)
    /// before the lock is taken. If every slot is occupied it is destroyed
    /// instead. Buffers whose static size differs from the pool's are never
    /// stored, so all idle buffers stay interchangeable.
    pub fn release(&self, mut buffer: Box<Buffer>) {
        buffer.reset();

        let rejected = if buffer.static_capacity() != self.buffer_size {
            Some(buffer)
        } else {
            let mut slots = self.slots.lock();
            if slots.len() >= self.capacity {
                Some(buffer)
            } else {
                slots.push(buffer);
                None
            }
        };

        if let Some(buffer) = rejected {
            self.metrics.discarded.fetch_add(1, Ordering::Relaxed);
            debug!(
                static_capacity = buffer.static_capacity(),
                "Destroying released buffer instead of pooling it"
            );
            drop(buffer);
        }
    }

    /// Snapshot the pool's statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity,
            available: self.available(),
            created: self.metrics.created.load(Ordering::Relaxed),
            reused: self.metrics.reused.load(Ordering::Relaxed),
            overflow_created: self.metrics.overflow_created.load(Ordering::Relaxed),
            discarded: self.metrics.discarded.load(Ordering::Relaxed),
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        let idle = self.slots.get_mut().len();
        debug!(idle, "Dropping buffer Pool");
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity)
            .field("buffer_size", &self.buffer_size)
            .field("available", &self.available())
            .finish()
    }
}
