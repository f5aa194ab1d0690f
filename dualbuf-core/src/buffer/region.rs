//! Owned byte span tagged with the allocator that produced it.

use std::fmt;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::slice;

use crate::alloc::SharedAllocator;
use crate::error::Result;

/// A contiguous block of `len` bytes.
///
/// The region keeps a handle to its allocator and frees itself through that
/// handle on drop, so a block can never be returned to the wrong allocator.
/// Its contents start uninitialized; callers only read prefixes they wrote.
pub(crate) struct Region {
    ptr: NonNull<u8>,
    len: usize,
    owner: SharedAllocator,
}

// SAFETY: the region exclusively owns its block and the owner handle is
// `Send + Sync`.
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Region {
    /// Allocate `len` bytes from `owner`. Zero-length regions never touch
    /// the allocator.
    pub(crate) fn allocate(owner: SharedAllocator, len: usize) -> Result<Self> {
        let ptr = if len == 0 {
            NonNull::dangling()
        } else {
            owner.allocate(len)?
        };
        Ok(Self { ptr, len, owner })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn owner(&self) -> &SharedAllocator {
        &self.owner
    }

    /// The first `len` bytes.
    ///
    /// # Safety
    /// `len <= self.len()` and those bytes must have been written.
    pub(crate) unsafe fn prefix(&self, len: usize) -> &[u8] {
        debug_assert!(len <= self.len);
        slice::from_raw_parts(self.ptr.as_ptr(), len)
    }

    /// Copy `data` to `offset`.
    ///
    /// # Safety
    /// `offset + data.len() <= self.len()`.
    pub(crate) unsafe fn copy_from_unchecked(&mut self, offset: usize, data: &[u8]) {
        debug_assert!(offset + data.len() <= self.len, "region write out of bounds");
        ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.as_ptr().add(offset), data.len());
    }

    /// Fill `count` bytes at `offset` with `byte`.
    ///
    /// # Safety
    /// `offset + count <= self.len()`.
    pub(crate) unsafe fn fill_unchecked(&mut self, offset: usize, byte: u8, count: usize) {
        debug_assert!(offset + count <= self.len, "region fill out of bounds");
        ptr::write_bytes(self.ptr.as_ptr().add(offset), byte, count);
    }

    /// Bounds-checked [`copy_from_unchecked`](Self::copy_from_unchecked).
    ///
    /// # Panics
    /// If the span does not fit in the region.
    pub(crate) fn copy_from(&mut self, offset: usize, data: &[u8]) {
        let end = offset.checked_add(data.len());
        assert!(
            matches!(end, Some(end) if end <= self.len),
            "write of {} bytes at offset {} exceeds region of {} bytes",
            data.len(),
            offset,
            self.len
        );
        // SAFETY: checked above.
        unsafe { self.copy_from_unchecked(offset, data) }
    }

    /// Ask the owner to resize this block without moving it.
    pub(crate) fn resize_in_place(&mut self, new_len: usize) -> bool {
        if self.len == 0 {
            return false;
        }
        // SAFETY: `ptr`/`len` describe a live block of `owner`.
        let resized = unsafe { self.owner.resize_in_place(self.ptr, self.len, new_len) };
        if resized {
            self.len = new_len;
        }
        resized
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        if self.len > 0 {
            // SAFETY: the block came from `owner` and is dropped exactly once.
            unsafe { self.owner.deallocate(self.ptr, self.len) }
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region").field("len", &self.len).finish()
    }
}

/// Exact-size copy of a buffer's contents, freed through the allocator it
/// was copied into.
///
/// Returned by [`Buffer::copy_in`](crate::Buffer::copy_in).
pub struct OwnedBytes {
    region: Region,
}

impl OwnedBytes {
    pub(crate) fn copy_of(owner: SharedAllocator, data: &[u8]) -> Result<Self> {
        let mut region = Region::allocate(owner, data.len())?;
        // SAFETY: the region is exactly `data.len()` bytes long.
        unsafe { region.copy_from_unchecked(0, data) };
        Ok(Self { region })
    }

    /// Borrow the bytes.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: every byte was written in `copy_of`.
        unsafe { self.region.prefix(self.region.len()) }
    }

    /// Allocator that owns the copy.
    pub fn allocator(&self) -> &SharedAllocator {
        self.region.owner()
    }
}

impl Deref for OwnedBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for OwnedBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for OwnedBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedBytes").field(&self.as_bytes()).finish()
    }
}
