//! Error type shared by every allocating path in the crate.
//!
//! Allocation failure is the only recoverable error the buffer and pool can
//! report. Out-of-bounds use of the unchecked writers is a contract
//! violation, not an error, and is expressed through `unsafe` instead.

use thiserror::Error;

/// An allocator could not satisfy a request.
///
/// Raised by buffer growth, [`Buffer::copy_in`](crate::Buffer::copy_in),
/// pool construction and pool overflow construction. When growth fails the
/// buffer keeps its previously written bytes untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("allocation of {requested} bytes failed")]
pub struct AllocError {
    /// Number of bytes that were requested.
    pub requested: usize,
}

impl AllocError {
    /// Build an error for a request of `requested` bytes.
    pub fn new(requested: usize) -> Self {
        Self { requested }
    }

    /// Error for a size computation that does not fit in `usize`.
    pub fn overflow() -> Self {
        Self {
            requested: usize::MAX,
        }
    }
}

impl From<AllocError> for std::io::Error {
    fn from(err: AllocError) -> Self {
        std::io::Error::new(std::io::ErrorKind::OutOfMemory, err)
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = AllocError> = std::result::Result<T, E>;
