//! Growable Byte Buffer with a Static and a Dynamic Region
//!
//! A [`Buffer`] is created with a fixed *static* region allocated once by its
//! primary allocator. Writes that outgrow it spill into a *dynamic* region
//! obtained from the dynamic allocator (when one is set) or the primary
//! allocator. The static region is never resized or freed before the buffer
//! is dropped, which is what lets a [`Pool`](crate::Pool) recycle it.
//!
//! # Performance-First Design:
//! - Writes that fit the static region never touch an allocator
//! - Growth follows `cap + cap/2 + 8`, amortized without doubling small buffers
//! - A dynamic region first tries to grow in place before falling back to
//!   allocate-copy-free
//! - [`View`] patches reserved bytes (length prefixes) without re-encoding

pub mod endian;
mod region;
pub mod view;
pub mod writer;

use std::fmt;

use tracing::{debug, trace};

use crate::alloc::{self, SharedAllocator};
use crate::error::{AllocError, Result};

pub use endian::Endian;
pub use region::OwnedBytes;
pub use view::View;
pub use writer::Writer;

use region::Region;

/// Next capacity when `required` bytes must fit in a region of `current`.
///
/// Starts at `current` and adds `current / 2 + 8` until the target is met.
/// Saturates instead of overflowing; the allocator then refuses the request.
pub fn grow_capacity(current: usize, required: usize) -> usize {
    let mut capacity = current;
    while capacity < required {
        capacity = capacity.saturating_add(capacity / 2 + 8);
    }
    capacity
}

/// Byte accumulator with dual-allocator ownership.
///
/// Invariants:
/// - the active region is the dynamic one when present, else the static one
/// - `len() <= capacity()`
/// - every region is freed by the allocator that allocated it
///
/// A buffer carries no synchronization; it is `Send` so the pool can hand it
/// to another thread, but it must be owned by one caller at a time.
pub struct Buffer {
    /// Allocated once by the primary allocator, which it also records.
    static_region: Region,
    /// Present after the first write that overflowed the static region.
    dynamic_region: Option<Region>,
    /// Overrides the primary allocator for dynamic growth.
    dynamic_allocator: Option<SharedAllocator>,
    /// Bytes written so far.
    position: usize,
}

impl Buffer {
    /// Create a buffer whose static region holds exactly `size` bytes.
    pub fn new(allocator: SharedAllocator, size: usize) -> Result<Self> {
        let static_region = Region::allocate(allocator, size)?;
        trace!(size, "Allocated buffer static region");
        Ok(Self {
            static_region,
            dynamic_region: None,
            dynamic_allocator: None,
            position: 0,
        })
    }

    /// Create a buffer backed by the process heap.
    pub fn with_capacity(size: usize) -> Result<Self> {
        Self::new(alloc::system(), size)
    }

    /// Allocator that owns the static region.
    pub fn primary_allocator(&self) -> &SharedAllocator {
        self.static_region.owner()
    }

    /// Allocator override for dynamic growth, if any.
    pub fn dynamic_allocator(&self) -> Option<&SharedAllocator> {
        self.dynamic_allocator.as_ref()
    }

    /// Set or clear the dynamic growth allocator.
    ///
    /// A dynamic region that already exists stays with the allocator that
    /// produced it and is freed there; the new allocator is used from the
    /// next reallocation on.
    pub fn set_dynamic_allocator(&mut self, allocator: Option<SharedAllocator>) {
        self.dynamic_allocator = allocator;
    }

    fn growth_allocator(&self) -> SharedAllocator {
        self.dynamic_allocator
            .as_ref()
            .unwrap_or_else(|| self.primary_allocator())
            .clone()
    }

    fn active(&self) -> &Region {
        self.dynamic_region.as_ref().unwrap_or(&self.static_region)
    }

    fn active_mut(&mut self) -> &mut Region {
        self.dynamic_region.as_mut().unwrap_or(&mut self.static_region)
    }

    /// Number of bytes written.
    pub fn len(&self) -> usize {
        self.position
    }

    /// Returns `true` when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// Size of the active region.
    pub fn capacity(&self) -> usize {
        self.active().len()
    }

    /// Size of the static region, fixed for the buffer's lifetime.
    pub fn static_capacity(&self) -> usize {
        self.static_region.len()
    }

    /// Bytes that can be written before the next growth.
    pub fn unused_capacity(&self) -> usize {
        self.capacity() - self.position
    }

    /// Returns `true` once writes have spilled into a dynamic region.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic_region.is_some()
    }

    /// The written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `position <= capacity` and bytes before `position` are
        // always initialized (`skip` zero-fills what it reserves).
        unsafe { self.active().prefix(self.position) }
    }

    /// Copy the written bytes into a `Vec`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Copy the written bytes into an exact-size block owned by `allocator`.
    pub fn copy_in(&self, allocator: SharedAllocator) -> Result<OwnedBytes> {
        OwnedBytes::copy_of(allocator, self.as_bytes())
    }

    /// Drop the last `n` bytes; clamps at zero. Never frees memory.
    pub fn truncate(&mut self, n: usize) {
        self.position = self.position.saturating_sub(n);
    }

    /// Free the dynamic region, clear the dynamic allocator and rewind.
    ///
    /// Afterwards the buffer is indistinguishable from a fresh one with the
    /// same primary allocator and static size.
    pub fn reset(&mut self) {
        if let Some(region) = self.dynamic_region.take() {
            trace!(capacity = region.len(), "Releasing dynamic region");
        }
        self.dynamic_allocator = None;
        self.position = 0;
    }

    /// Rewind to zero but keep whatever region is active.
    pub fn reset_retaining_capacity(&mut self) {
        self.position = 0;
    }

    /// Make room for `additional` more bytes.
    pub fn ensure_unused_capacity(&mut self, additional: usize) -> Result<()> {
        let required = self
            .position
            .checked_add(additional)
            .ok_or_else(AllocError::overflow)?;
        self.ensure_total_capacity(required)
    }

    /// Grow the active region until it holds at least `required` bytes.
    ///
    /// The static region is never moved: the first growth allocates a
    /// dynamic region and copies the written prefix into it. Later growth
    /// resizes the dynamic region in place when its allocator allows and
    /// otherwise reallocates, freeing the old block through its owner. On
    /// failure the buffer is left as it was.
    pub fn ensure_total_capacity(&mut self, required: usize) -> Result<()> {
        let capacity = self.capacity();
        if required <= capacity {
            return Ok(());
        }
        let new_capacity = grow_capacity(capacity, required);

        if let Some(region) = self.dynamic_region.as_mut() {
            if region.resize_in_place(new_capacity) {
                trace!(from = capacity, to = new_capacity, "Resized dynamic region in place");
                return Ok(());
            }
        }

        let mut next = Region::allocate(self.growth_allocator(), new_capacity)?;
        // SAFETY: `new_capacity > capacity >= position`.
        unsafe { next.copy_from_unchecked(0, self.as_bytes()) };
        debug!(
            from = capacity,
            to = new_capacity,
            spilled = self.dynamic_region.is_none(),
            "Growing buffer"
        );
        self.dynamic_region = Some(next);
        Ok(())
    }

    /// Append one byte.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.ensure_unused_capacity(1)?;
        // SAFETY: capacity reserved above.
        unsafe { self.write_byte_unchecked(byte) };
        Ok(())
    }

    /// Append `byte` `count` times.
    pub fn write_byte_n_times(&mut self, byte: u8, count: usize) -> Result<()> {
        self.ensure_unused_capacity(count)?;
        // SAFETY: capacity reserved above.
        unsafe { self.write_byte_n_times_unchecked(byte, count) };
        Ok(())
    }

    /// Append `data`.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_unused_capacity(data.len())?;
        // SAFETY: capacity reserved above.
        unsafe { self.write_unchecked(data) };
        Ok(())
    }

    /// Append one byte without checking capacity.
    ///
    /// # Safety
    /// `unused_capacity() >= 1`, e.g. after
    /// [`ensure_unused_capacity`](Self::ensure_unused_capacity).
    pub unsafe fn write_byte_unchecked(&mut self, byte: u8) {
        self.write_byte_n_times_unchecked(byte, 1);
    }

    /// Append `byte` `count` times without checking capacity.
    ///
    /// # Safety
    /// `unused_capacity() >= count`.
    pub unsafe fn write_byte_n_times_unchecked(&mut self, byte: u8, count: usize) {
        let position = self.position;
        self.active_mut().fill_unchecked(position, byte, count);
        self.position += count;
    }

    /// Append `data` without checking capacity.
    ///
    /// # Safety
    /// `unused_capacity() >= data.len()`.
    pub unsafe fn write_unchecked(&mut self, data: &[u8]) {
        let position = self.position;
        self.active_mut().copy_from_unchecked(position, data);
        self.position += data.len();
    }

    /// Overwrite bytes at `pos` without moving the write position.
    ///
    /// # Panics
    /// If `pos + data.len()` exceeds the current capacity.
    pub fn write_at(&mut self, data: &[u8], pos: usize) {
        self.active_mut().copy_from(pos, data);
    }

    /// Append a `u8`.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_byte(value)
    }

    /// Append an `i8`.
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_byte(value as u8)
    }

    /// Reserve `n` zeroed bytes and return a [`View`] over them.
    ///
    /// The usual pattern is to skip a length prefix, write the payload and
    /// then fill the prefix through the view.
    pub fn skip(&mut self, n: usize) -> Result<View> {
        self.write_byte_n_times(0, n)?;
        Ok(View::new(self.position - n, n))
    }

    /// `std::io::Write` adapter appending to this buffer.
    pub fn writer(&mut self) -> Writer<'_> {
        Writer::new(self)
    }
}

macro_rules! int_writers {
    ($($name:ident($ty:ty) => $encode:ident;)*) => {
        impl Buffer {
            $(
                #[doc = concat!("Append a `", stringify!($ty), "` in the given byte order.")]
                pub fn $name(&mut self, value: $ty, endian: Endian) -> Result<()> {
                    self.write(&endian.$encode(value))
                }
            )*
        }
    };
}

int_writers! {
    write_u16(u16) => encode_u16;
    write_u32(u32) => encode_u32;
    write_u64(u64) => encode_u64;
    write_i16(i16) => encode_i16;
    write_i32(i32) => encode_i32;
    write_i64(i64) => encode_i64;
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.position)
            .field("capacity", &self.capacity())
            .field("static_capacity", &self.static_capacity())
            .field("dynamic", &self.is_dynamic())
            .field("dynamic_allocator", &self.dynamic_allocator.is_some())
            .finish()
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
