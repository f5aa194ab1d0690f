//! Process heap allocator.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use super::Allocator;
use crate::error::{AllocError, Result};

/// Allocates from the global Rust allocator with byte alignment.
///
/// The global allocator offers no in-place growth guarantee, so
/// [`Allocator::resize_in_place`] always refuses and growing buffers fall
/// back to allocate-copy-free.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

fn byte_layout(len: usize) -> Result<Layout> {
    Layout::from_size_align(len, 1).map_err(|_| AllocError::new(len))
}

impl Allocator for SystemAllocator {
    fn allocate(&self, len: usize) -> Result<NonNull<u8>> {
        debug_assert!(len > 0, "zero-length requests never reach the allocator");
        let layout = byte_layout(len)?;
        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::new(len))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, len: usize) {
        // The layout was valid when the block was allocated.
        let layout = Layout::from_size_align_unchecked(len, 1);
        alloc::dealloc(ptr.as_ptr(), layout);
    }
}
