//! Dualbuf Core - Growable Byte Buffers with Dual Allocators
//!
//! This crate provides a byte buffer that starts in a fixed static region and
//! spills into a dynamically allocated region when it outgrows it, plus a
//! thread-safe pool that recycles such buffers across requests.
//!
//! # Performance-First Design Patterns:
//! - Static regions are allocated once and reused for the lifetime of a pool
//! - Dynamic growth can be routed to a per-request allocator (e.g. an arena)
//! - Growth tries in-place resize before copying
//! - Views patch reserved bytes such as length prefixes without re-encoding

pub mod alloc;
pub mod buffer;
pub mod error;
pub mod pool;

pub use alloc::{Allocator, ArenaAllocator, SharedAllocator, SystemAllocator, TrackingAllocator};
pub use buffer::{Buffer, Endian, OwnedBytes, View, Writer};
pub use error::{AllocError, Result};
pub use pool::{Pool, PoolConfig, PoolStats};

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber for binaries and benchmarks.
///
/// Honors `RUST_LOG` and defaults to `info`. Calling it again, or after
/// another subscriber was installed, is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        info!("Initializing dualbuf v{}", env!("CARGO_PKG_VERSION"));
    }
}
