//! Error values for `RingBuffer`.

use core::alloc::Layout;

/// Failure of a capacity changing operation.
///
/// Reading from or writing to a `RingBuffer` never fails; only
/// construction and `resize` return this error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The requested capacity is below the supported minimum.
    ///
    /// Rejected before the allocator is touched.
    #[error("invalid capacity {requested}: a ring needs at least {minimum} nodes")]
    InvalidCapacity {
        /// The capacity that was asked for.
        requested: usize,
        /// The smallest accepted capacity.
        minimum: usize,
    },

    /// The allocator could not provide memory for a node.
    #[error("allocator failed to provide {} bytes for a node", .layout.size())]
    AllocationFailure {
        /// The layout of the node that could not be allocated.
        layout: Layout,
    },
}

/// Result type used by the capacity changing operations.
pub type Result<T> = core::result::Result<T, Error>;
