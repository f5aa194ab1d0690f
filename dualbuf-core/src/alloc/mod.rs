//! Allocator Abstraction
//!
//! Buffers never talk to the global heap directly. Every region is obtained
//! from an [`Allocator`] handle that the buffer stores alongside the region,
//! so the memory is always returned to the allocator that produced it.
//!
//! # Provided allocators:
//! - [`SystemAllocator`]: the process heap
//! - [`ArenaAllocator`]: a fixed-capacity bump arena for short-lived growth
//! - [`TrackingAllocator`]: a counting wrapper with an optional byte limit

pub mod arena;
pub mod system;
pub mod tracking;

use std::ptr::NonNull;
use std::sync::Arc;

use crate::error::Result;

pub use arena::ArenaAllocator;
pub use system::SystemAllocator;
pub use tracking::{AllocStats, TrackingAllocator};

/// A source of untyped, byte-aligned memory blocks.
///
/// Implementations must be usable from several threads at once: the pool
/// hands the same allocator to buffers living on different threads.
///
/// Callers never request zero-length blocks; regions of length zero are
/// represented without touching the allocator.
pub trait Allocator: Send + Sync {
    /// Allocate a block of exactly `len` bytes (`len > 0`).
    ///
    /// The returned memory is uninitialized.
    fn allocate(&self, len: usize) -> Result<NonNull<u8>>;

    /// Return a block to the allocator.
    ///
    /// # Safety
    /// `ptr` must have been returned by [`allocate`](Self::allocate) on this
    /// allocator, `len` must be its current length, and the block must not
    /// be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, len: usize);

    /// Try to change the length of a block without moving it.
    ///
    /// Returns `false` when the allocator cannot resize in place; the block
    /// is then left untouched at `old_len`. The default refuses every
    /// request.
    ///
    /// # Safety
    /// Same as [`deallocate`](Self::deallocate): `ptr`/`old_len` must
    /// describe a live block of this allocator.
    unsafe fn resize_in_place(&self, ptr: NonNull<u8>, old_len: usize, new_len: usize) -> bool {
        let _ = (ptr, old_len, new_len);
        false
    }
}

/// Reference-counted allocator handle stored by buffers and pools.
pub type SharedAllocator = Arc<dyn Allocator>;

/// Handle to the process heap.
pub fn system() -> SharedAllocator {
    Arc::new(SystemAllocator)
}
