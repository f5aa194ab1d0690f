//! Performance benchmarks for Dualbuf Core.
//!
//! These tests measure timing for key operations and validate that
//! performance stays within acceptable bounds. Run with:
//!
//! ```sh
//! cargo test -p dualbuf-core --test benchmarks -- --ignored --nocapture
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use dualbuf_core::{alloc, ArenaAllocator, Buffer, Endian, Pool, TrackingAllocator};

const PAYLOAD: &[u8] = b"benchmark payload data for buffer pool test";

// ---------------------------------------------------------------------------
// Buffer growth benchmark
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn bench_buffer_growth() {
    const ITERATIONS: usize = 1000;
    const FRAME: usize = 64 * 1024;

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let mut buf = Buffer::with_capacity(256).unwrap();
        while buf.len() < FRAME {
            buf.write(PAYLOAD).unwrap();
        }
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / ITERATIONS as u32;

    eprintln!("[bench_buffer_growth] {ITERATIONS} x {FRAME} bytes in {elapsed:?} ({per_iter:?}/iter)");
    assert!(
        per_iter.as_millis() < 10,
        "growing a buffer to 64 KiB should take < 10 ms, got {per_iter:?}"
    );
}

// ---------------------------------------------------------------------------
// Length-prefixed framing benchmark
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn bench_length_prefixed_frames() {
    const FRAMES: usize = 100_000;
    let mut buf = Buffer::with_capacity(4096).unwrap();

    let start = Instant::now();
    for i in 0..FRAMES {
        let mut prefix = buf.skip(4).unwrap();
        buf.write_u64(i as u64, Endian::Little).unwrap();
        buf.write(PAYLOAD).unwrap();
        prefix.write_u32(&mut buf, (8 + PAYLOAD.len()) as u32);
    }
    let elapsed = start.elapsed();

    eprintln!(
        "[bench_length_prefixed_frames] {FRAMES} frames ({} bytes) in {elapsed:?}",
        buf.len()
    );
    assert_eq!(buf.len(), FRAMES * (4 + 8 + PAYLOAD.len()));
    assert!(
        elapsed.as_millis() < 1000,
        "100k frames should be written in < 1 s, got {elapsed:?}"
    );
}

// ---------------------------------------------------------------------------
// Buffer pool benchmark
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn bench_buffer_pool_allocations() {
    const ITERATIONS: usize = 1000;
    let primary = Arc::new(TrackingAllocator::new());
    let pool = Pool::new(primary.clone(), 10, 4096).unwrap();

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        let mut buf = pool.acquire().unwrap();
        buf.write(PAYLOAD).unwrap();
        pool.release(buf);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / ITERATIONS as u32;

    let stats = pool.stats();
    eprintln!(
        "[bench_buffer_pool] {ITERATIONS} acquire+release cycles in {elapsed:?} ({per_iter:?}/iter)"
    );
    eprintln!(
        "  created={}, reused={}, overflow={}, discarded={}",
        stats.created, stats.reused, stats.overflow_created, stats.discarded
    );
    assert_eq!(stats.reused, ITERATIONS as u64, "pool should reuse every buffer");
    assert_eq!(
        primary.stats().allocations,
        10,
        "static regions must not be reallocated"
    );
    assert!(
        elapsed.as_millis() < 1000,
        "1000 buffer acquire+release cycles should finish in < 1 s, got {elapsed:?}"
    );
}

// ---------------------------------------------------------------------------
// Contended pool benchmark
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn bench_contended_pool_with_arena() {
    const THREADS: usize = 8;
    const ITERATIONS: usize = 10_000;

    let pool = Arc::new(Pool::new(alloc::system(), THREADS, 512).unwrap());
    let start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let mut arena = Arc::new(ArenaAllocator::new(64 * 1024).unwrap());
                for _ in 0..ITERATIONS {
                    let mut buf = pool.acquire_with_allocator(arena.clone()).unwrap();
                    buf.write_byte_n_times(0x5A, 2048).unwrap();
                    pool.release(buf);
                    Arc::get_mut(&mut arena).unwrap().reset();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let elapsed = start.elapsed();

    let stats = pool.stats();
    eprintln!(
        "[bench_contended_pool] {THREADS} threads x {ITERATIONS} cycles in {elapsed:?} (overflow={})",
        stats.overflow_created
    );
    assert!(
        elapsed.as_secs() < 5,
        "contended pool cycles should finish in < 5 s, got {elapsed:?}"
    );
}
