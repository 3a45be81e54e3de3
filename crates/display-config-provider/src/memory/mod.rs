//! Views over native memory blocks.
//!
//! A [`NativeView`] owns one allocation made by a [`NativeAllocator`] and knows the layout and
//! number of the records it holds. Reads and writes are checked against both.

mod allocator;
mod record;
mod view;

pub use allocator::{HeapAllocator, NativeAllocator};
#[cfg(windows)]
pub use allocator::CoTaskAllocator;
pub use record::{ErasedRecord, NativeRecord, RecordKind, RecordLayout};
pub use view::NativeView;

use thiserror::Error;

/// Native memory errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The native allocator returned a null address.
    #[error("Failed to allocate {bytes} bytes of native memory")]
    AllocationFailure {
        /// Size of the failed allocation.
        bytes: usize,
    },

    /// The view does not point at any memory.
    #[error("Native view is null")]
    InvalidHandle,

    /// The requested record type does not match the records in the view.
    #[error("Native view holds {found} records, {expected} was requested")]
    TypeMismatch {
        /// Name of the requested record kind.
        expected: &'static str,
        /// Name of the record kind the view holds.
        found: &'static str,
    },

    /// The index is past the records the view was created with.
    #[error("Record {index} is out of bounds for a view of {len} records")]
    OutOfBounds {
        /// The requested record.
        index: usize,
        /// Number of records in the view.
        len: usize,
    },
}
