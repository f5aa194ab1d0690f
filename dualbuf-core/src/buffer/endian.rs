//! Byte order for fixed-width integer writes.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order chosen per call.
///
/// Signed integers are encoded as the two's complement of the same width,
/// so they share the layout of their unsigned counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first (network order).
    #[default]
    Big,
}

macro_rules! encoders {
    ($($name:ident($ty:ty) => $write:ident;)*) => {
        impl Endian {
            $(
                #[doc = concat!("Encode a `", stringify!($ty), "` in this byte order.")]
                pub fn $name(self, value: $ty) -> [u8; std::mem::size_of::<$ty>()] {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    match self {
                        Endian::Little => LittleEndian::$write(&mut bytes, value),
                        Endian::Big => BigEndian::$write(&mut bytes, value),
                    }
                    bytes
                }
            )*
        }
    };
}

encoders! {
    encode_u16(u16) => write_u16;
    encode_u32(u32) => write_u32;
    encode_u64(u64) => write_u64;
    encode_i16(i16) => write_i16;
    encode_i32(i32) => write_i32;
    encode_i64(i64) => write_i64;
}
