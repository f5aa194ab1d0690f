//! Property tests for buffer growth, reset, truncation, views and byte order.
//!
//! Each property drives a `Buffer` with generated write sequences and checks
//! it against a plain `Vec<u8>` model.

use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use dualbuf_core::{Buffer, Endian, TrackingAllocator};
use proptest::prelude::*;

fn chunks() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..48), 0..24)
}

proptest! {
    #[test]
    fn prop_growth_matches_model(static_size in 0usize..64, writes in chunks()) {
        let mut buf = Buffer::with_capacity(static_size).unwrap();
        let mut model = Vec::new();

        for chunk in &writes {
            buf.write(chunk).unwrap();
            model.extend_from_slice(chunk);

            prop_assert_eq!(buf.as_bytes(), model.as_slice());
            prop_assert_eq!(buf.is_dynamic(), model.len() > static_size);
            prop_assert!(buf.len() <= buf.capacity());
            prop_assert_eq!(buf.static_capacity(), static_size);
        }
    }

    #[test]
    fn prop_reset_restores_fresh_state(
        static_size in 0usize..64,
        before in chunks(),
        after in chunks(),
    ) {
        let mut reused = Buffer::with_capacity(static_size).unwrap();
        for chunk in &before {
            reused.write(chunk).unwrap();
        }
        reused.reset();

        let mut fresh = Buffer::with_capacity(static_size).unwrap();
        prop_assert_eq!(reused.capacity(), fresh.capacity());

        for chunk in &after {
            reused.write(chunk).unwrap();
            fresh.write(chunk).unwrap();
            prop_assert_eq!(reused.as_bytes(), fresh.as_bytes());
            prop_assert_eq!(reused.capacity(), fresh.capacity());
            prop_assert_eq!(reused.is_dynamic(), fresh.is_dynamic());
        }
    }

    #[test]
    fn prop_truncate_boundary(data in prop::collection::vec(any::<u8>(), 0..200), n in 0usize..300) {
        let mut buf = Buffer::with_capacity(32).unwrap();
        buf.write(&data).unwrap();
        let capacity = buf.capacity();

        buf.truncate(n);
        if n >= data.len() {
            prop_assert_eq!(buf.len(), 0);
        } else {
            prop_assert_eq!(buf.len(), data.len() - n);
            prop_assert_eq!(buf.as_bytes(), &data[..data.len() - n]);
        }
        prop_assert_eq!(buf.capacity(), capacity);
    }

    #[test]
    fn prop_skip_view_length_prefix(
        static_size in 0usize..32,
        payload in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let mut buf = Buffer::with_capacity(static_size).unwrap();
        let mut prefix = buf.skip(4).unwrap();
        buf.write(&payload).unwrap();
        prefix.write_u32(&mut buf, payload.len() as u32);

        prop_assert_eq!(BigEndian::read_u32(&buf.as_bytes()[..4]) as usize, payload.len());
        prop_assert_eq!(&buf.as_bytes()[4..], payload.as_slice());
    }

    #[test]
    fn prop_endian_round_trip(value in any::<u64>(), signed in any::<i32>()) {
        let mut buf = Buffer::with_capacity(4).unwrap();
        buf.write_u64(value, Endian::Little).unwrap();
        buf.write_u64(value, Endian::Big).unwrap();
        buf.write_i32(signed, Endian::Big).unwrap();

        let bytes = buf.as_bytes();
        prop_assert_eq!(LittleEndian::read_u64(&bytes[..8]), value);
        prop_assert_eq!(BigEndian::read_u64(&bytes[8..16]), value);
        prop_assert_eq!(BigEndian::read_i32(&bytes[16..20]), signed);
    }

    #[test]
    fn prop_no_leaks(static_size in 0usize..64, writes in chunks(), reset_midway in any::<bool>()) {
        let primary = Arc::new(TrackingAllocator::new());
        {
            let mut buf = Buffer::new(primary.clone(), static_size).unwrap();
            for (i, chunk) in writes.iter().enumerate() {
                buf.write(chunk).unwrap();
                if reset_midway && i == writes.len() / 2 {
                    buf.reset();
                }
            }
        }
        let stats = primary.stats();
        prop_assert_eq!(stats.live_bytes, 0);
        prop_assert_eq!(stats.allocations, stats.deallocations);
    }
}

#[test]
fn test_u64_wire_contract() {
    let mut buf = Buffer::with_capacity(8).unwrap();
    buf.write_u64(11234567890123456789, Endian::Little).unwrap();
    assert_eq!(buf.as_bytes(), &[21, 129, 209, 7, 249, 51, 233, 155]);
    assert_eq!(LittleEndian::read_u64(buf.as_bytes()), 11234567890123456789);

    buf.reset();
    buf.write_u64(11234567890123456789, Endian::Big).unwrap();
    assert_eq!(buf.as_bytes(), &[155, 233, 51, 249, 7, 209, 129, 21]);
    assert_eq!(BigEndian::read_u64(buf.as_bytes()), 11234567890123456789);
}
