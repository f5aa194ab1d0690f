//! Dualbuf Pool Benchmark
//!
//! Drives a shared pool from many tokio tasks twice: once growing through
//! the heap and once growing through a per-task arena, then prints the pool
//! and allocator counters.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p dualbuf-core --example benchmark
//! ```

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use dualbuf_core::{init_tracing, ArenaAllocator, Endian, Pool, PoolConfig, TrackingAllocator};
use tracing::info;

const TASKS: usize = 64;
const FRAMES_PER_TASK: usize = 2_000;
const FRAME_PAYLOAD: usize = 6 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = PoolConfig::default();
    println!("Dualbuf Pool Benchmark");
    println!("═══════════════════════════════════════════════════════════");
    println!(
        "pool capacity={}  buffer_size={}  tasks={}  frames/task={}  payload={}",
        config.capacity, config.buffer_size, TASKS, FRAMES_PER_TASK, FRAME_PAYLOAD
    );
    println!();

    println!("Benchmark 1: dynamic growth through the pool allocator");
    run(&config, false).await?;
    println!();

    println!("Benchmark 2: dynamic growth through a per-task arena");
    run(&config, true).await?;

    Ok(())
}

async fn run(config: &PoolConfig, use_arena: bool) -> anyhow::Result<()> {
    let primary = Arc::new(TrackingAllocator::new());
    let pool = Arc::new(Pool::from_config(primary.clone(), config).context("building pool")?);

    let start = Instant::now();
    let mut tasks = Vec::with_capacity(TASKS);
    for task in 0..TASKS {
        let pool = Arc::clone(&pool);
        tasks.push(tokio::spawn(async move {
            let arena = if use_arena {
                Some(Arc::new(ArenaAllocator::new(64 * 1024)?))
            } else {
                None
            };
            let mut bytes = 0usize;
            for frame in 0..FRAMES_PER_TASK {
                let mut buf = match &arena {
                    Some(arena) => pool.acquire_with_allocator(arena.clone())?,
                    None => pool.acquire()?,
                };
                let mut prefix = buf.skip(4)?;
                buf.write_u32(task as u32, Endian::Big)?;
                buf.write_u64(frame as u64, Endian::Big)?;
                buf.write_byte_n_times(0xA5, FRAME_PAYLOAD)?;
                let frame_len = buf.len();
                prefix.write_u32(&mut buf, (frame_len - 4) as u32);
                bytes += frame_len;
                pool.release(buf);
                if frame % 64 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            Ok::<usize, dualbuf_core::AllocError>(bytes)
        }));
    }

    let mut total = 0usize;
    for task in tasks {
        total += task.await.context("task panicked")??;
    }
    let elapsed = start.elapsed();

    let stats = pool.stats();
    let heap = primary.stats();
    info!(?stats, "Pool statistics");
    println!(
        "  {} frames, {:.1} MiB in {:?} ({:.0} MiB/s)",
        TASKS * FRAMES_PER_TASK,
        total as f64 / (1024.0 * 1024.0),
        elapsed,
        total as f64 / (1024.0 * 1024.0) / elapsed.as_secs_f64()
    );
    println!(
        "  pool: reused={} overflow={} discarded={} available={}/{}",
        stats.reused, stats.overflow_created, stats.discarded, stats.available, stats.capacity
    );
    println!(
        "  primary allocator: allocations={} frees={} live_bytes={}",
        heap.allocations, heap.deallocations, heap.live_bytes
    );
    Ok(())
}
