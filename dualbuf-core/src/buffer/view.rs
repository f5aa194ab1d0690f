//! Deferred writes into reserved bytes.

use super::{Buffer, Endian};

/// Cursor over a span reserved by [`Buffer::skip`].
///
/// A view owns no memory and does not borrow the buffer; each write takes
/// the buffer explicitly, so the payload can be appended between reserving
/// and filling the span. Offsets stay valid across growth because growth
/// copies the written prefix.
///
/// Writes never grow the buffer. Staying inside the reserved span is the
/// caller's job and is only asserted in debug builds; writing past the
/// buffer's capacity panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    offset: usize,
    len: usize,
    cursor: usize,
    endian: Endian,
}

impl View {
    pub(crate) fn new(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            cursor: 0,
            endian: Endian::default(),
        }
    }

    /// Use `endian` for the integer writers that take no explicit order.
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Default byte order of this view.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Absolute start of the span inside the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Reserved length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for a zero-length reservation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes written through the view so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Reserved bytes not yet written.
    pub fn remaining(&self) -> usize {
        self.len.saturating_sub(self.cursor)
    }

    /// Write one byte.
    pub fn write_byte(&mut self, buffer: &mut Buffer, byte: u8) {
        self.write(buffer, &[byte]);
    }

    /// Write `byte` `count` times.
    pub fn write_byte_n_times(&mut self, buffer: &mut Buffer, byte: u8, count: usize) {
        debug_assert!(count <= self.remaining(), "view write past reservation");
        let start = self.offset + self.cursor;
        let end = start
            .checked_add(count)
            .filter(|end| *end <= buffer.capacity());
        assert!(end.is_some(), "view write past buffer capacity");
        // SAFETY: `start + count <= capacity` checked above.
        unsafe { buffer.active_mut().fill_unchecked(start, byte, count) };
        self.cursor += count;
    }

    /// Write `data`.
    pub fn write(&mut self, buffer: &mut Buffer, data: &[u8]) {
        debug_assert!(data.len() <= self.remaining(), "view write past reservation");
        buffer.write_at(data, self.offset + self.cursor);
        self.cursor += data.len();
    }
}

macro_rules! view_int_writers {
    ($($name:ident, $name_with:ident($ty:ty) => $encode:ident;)*) => {
        impl View {
            $(
                #[doc = concat!("Write a `", stringify!($ty), "` in the view's default byte order.")]
                pub fn $name(&mut self, buffer: &mut Buffer, value: $ty) {
                    let endian = self.endian;
                    self.$name_with(buffer, value, endian);
                }

                #[doc = concat!("Write a `", stringify!($ty), "` in the given byte order.")]
                pub fn $name_with(&mut self, buffer: &mut Buffer, value: $ty, endian: Endian) {
                    self.write(buffer, &endian.$encode(value));
                }
            )*
        }
    };
}

view_int_writers! {
    write_u16, write_u16_with(u16) => encode_u16;
    write_u32, write_u32_with(u32) => encode_u32;
    write_u64, write_u64_with(u64) => encode_u64;
    write_i16, write_i16_with(i16) => encode_i16;
    write_i32, write_i32_with(i32) => encode_i32;
    write_i64, write_i64_with(i64) => encode_i64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefix_patch() {
        let mut buf = Buffer::with_capacity(4).unwrap();
        let mut prefix = buf.skip(4).unwrap();
        buf.write(b"payload that forces growth").unwrap();
        assert!(buf.is_dynamic());

        let payload_len = (buf.len() - 4) as u32;
        prefix.write_u32(&mut buf, payload_len);
        assert_eq!(&buf.as_bytes()[..4], &payload_len.to_be_bytes());
        assert_eq!(&buf.as_bytes()[4..], b"payload that forces growth");
        assert_eq!(prefix.remaining(), 0);
    }

    #[test]
    fn test_cursor_advances() {
        let mut buf = Buffer::with_capacity(16).unwrap();
        let mut view = buf.skip(6).unwrap();
        view.write_byte(&mut buf, 0xAA);
        view.write_u16_with(&mut buf, 0x0102, Endian::Little);
        assert_eq!(view.cursor(), 3);
        view.write_byte_n_times(&mut buf, 0xBB, 3);
        assert_eq!(view.cursor(), 6);
        assert_eq!(buf.as_bytes(), &[0xAA, 0x02, 0x01, 0xBB, 0xBB, 0xBB]);
    }

    #[test]
    fn test_default_endian_override() {
        let mut buf = Buffer::with_capacity(8).unwrap();
        let mut view = buf.skip(2).unwrap().with_endian(Endian::Little);
        view.write_i16(&mut buf, -2);
        assert_eq!(buf.as_bytes(), &[0xFE, 0xFF]);
        assert_eq!(view.endian(), Endian::Little);
    }

    #[test]
    fn test_view_does_not_move_position() {
        let mut buf = Buffer::with_capacity(8).unwrap();
        let mut view = buf.skip(4).unwrap();
        buf.write(b"xy").unwrap();
        view.write(&mut buf, b"abcd");
        assert_eq!(buf.len(), 6);
        assert_eq!(buf.as_bytes(), b"abcdxy");
    }

    #[test]
    fn test_write_past_len_does_not_grow() {
        let mut buf = Buffer::with_capacity(16).unwrap();
        let mut view = buf.skip(8).unwrap();
        buf.truncate(6);
        assert_eq!(buf.len(), 2);

        view.write(&mut buf, b"abcd");
        view.write_byte_n_times(&mut buf, 0xEE, 4);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.capacity(), 16);
        assert!(!buf.is_dynamic());
        assert_eq!(buf.as_bytes(), b"ab");
    }

    /// A view taken while the dynamic region was live, outliving a reset.
    fn stale_view() -> (Buffer, View) {
        let mut buf = Buffer::with_capacity(4).unwrap();
        let view = buf.skip(16).unwrap();
        assert!(buf.is_dynamic());
        buf.reset();
        assert_eq!(buf.capacity(), 4);
        (buf, view)
    }

    #[test]
    #[should_panic(expected = "exceeds region")]
    fn test_write_past_capacity_panics() {
        let (mut buf, mut view) = stale_view();
        view.write(&mut buf, &[1; 8]);
    }

    #[test]
    #[should_panic(expected = "view write past buffer capacity")]
    fn test_write_byte_n_times_past_capacity_panics() {
        let (mut buf, mut view) = stale_view();
        view.write_byte_n_times(&mut buf, 0xFF, 8);
    }
}
