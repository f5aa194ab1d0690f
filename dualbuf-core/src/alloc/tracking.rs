//! Allocation accounting.
//!
//! Wraps another allocator and counts what flows through it, the same way
//! the runtime's performance counters are kept: relaxed atomics and a
//! snapshot type. An optional live-byte limit turns it into a failure
//! injector for exercising the error paths of buffer growth.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::{Allocator, SystemAllocator};
use crate::error::{AllocError, Result};

/// Snapshot of a [`TrackingAllocator`]'s counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocStats {
    /// Successful `allocate` calls.
    pub allocations: u64,
    /// `deallocate` calls.
    pub deallocations: u64,
    /// Successful in-place resizes.
    pub in_place_resizes: u64,
    /// Requests refused by the limit or by the inner allocator.
    pub failures: u64,
    /// Bytes currently allocated and not yet freed.
    pub live_bytes: usize,
}

impl AllocStats {
    /// Blocks allocated and not yet freed.
    pub fn live_blocks(&self) -> u64 {
        self.allocations.saturating_sub(self.deallocations)
    }
}

/// Counting wrapper around another allocator.
#[derive(Debug, Default)]
pub struct TrackingAllocator<A = SystemAllocator> {
    inner: A,
    limit: Option<usize>,
    allocations: AtomicU64,
    deallocations: AtomicU64,
    in_place_resizes: AtomicU64,
    failures: AtomicU64,
    live_bytes: AtomicUsize,
}

impl TrackingAllocator<SystemAllocator> {
    /// Track the process heap.
    pub fn new() -> Self {
        Self::wrap(SystemAllocator)
    }

    /// Track the process heap, refusing requests that would push live
    /// bytes above `limit`.
    pub fn with_limit(limit: usize) -> Self {
        Self::wrap(SystemAllocator).limited(limit)
    }
}

impl<A: Allocator> TrackingAllocator<A> {
    /// Track an arbitrary allocator.
    pub fn wrap(inner: A) -> Self {
        Self {
            inner,
            limit: None,
            allocations: AtomicU64::new(0),
            deallocations: AtomicU64::new(0),
            in_place_resizes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            live_bytes: AtomicUsize::new(0),
        }
    }

    /// Set a live-byte ceiling.
    pub fn limited(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The wrapped allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Snapshot the counters.
    pub fn stats(&self) -> AllocStats {
        AllocStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            in_place_resizes: self.in_place_resizes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
        }
    }

    /// Count `len` more live bytes unless that would cross the limit.
    fn reserve(&self, len: usize) -> bool {
        let limit = self.limit;
        let reserved = self
            .live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                let next = live.checked_add(len)?;
                match limit {
                    Some(limit) if next > limit => None,
                    _ => Some(next),
                }
            });
        if reserved.is_err() {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        reserved.is_ok()
    }

    fn unreserve(&self, len: usize) {
        self.live_bytes.fetch_sub(len, Ordering::AcqRel);
    }
}

impl<A: Allocator> Allocator for TrackingAllocator<A> {
    fn allocate(&self, len: usize) -> Result<NonNull<u8>> {
        if !self.reserve(len) {
            return Err(AllocError::new(len));
        }
        match self.inner.allocate(len) {
            Ok(ptr) => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                Ok(ptr)
            }
            Err(err) => {
                self.unreserve(len);
                self.failures.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, len: usize) {
        self.inner.deallocate(ptr, len);
        self.unreserve(len);
        self.deallocations.fetch_add(1, Ordering::Relaxed);
    }

    unsafe fn resize_in_place(&self, ptr: NonNull<u8>, old_len: usize, new_len: usize) -> bool {
        let growth = new_len.saturating_sub(old_len);
        if growth > 0 && !self.reserve(growth) {
            return false;
        }
        if !self.inner.resize_in_place(ptr, old_len, new_len) {
            if growth > 0 {
                self.unreserve(growth);
            }
            return false;
        }
        if new_len < old_len {
            self.unreserve(old_len - new_len);
        }
        self.in_place_resizes.fetch_add(1, Ordering::Relaxed);
        true
    }
}
