//! `std::io::Write` for buffers.

use std::io;

use super::Buffer;

/// Streams bytes into a [`Buffer`].
///
/// Every `write` accepts the whole slice or fails with
/// [`io::ErrorKind::OutOfMemory`] when growth is refused, leaving the buffer
/// unchanged.
#[derive(Debug)]
pub struct Writer<'a> {
    buffer: &'a mut Buffer,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buffer: &'a mut Buffer) -> Self {
        Self { buffer }
    }
}

impl io::Write for Writer<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buffer.write(data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Same contract as [`Writer`]; handy where a `W: io::Write` is taken by
/// value or by `&mut`.
impl io::Write for Buffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        Buffer::write(self, data)?;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
