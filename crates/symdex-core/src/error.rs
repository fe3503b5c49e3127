//! # Error Types
//!
//! General error handling for the index structures and their serialized form.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

/// Main error type for index operations
///
/// Every failure is reported as a value. Symbol files in the wild routinely
/// contain duplicate, overlapping or malformed records, so callers are expected
/// to log a rejected store and keep loading rather than abort.
///
/// ## Error Categories
///
/// 1. **Store errors**: DuplicateKey, InvalidRange, OverlapViolation,
///    PartialContainmentViolation, DuplicateRange
/// 2. **Lookup errors**: IndexOutOfRange
/// 3. **Serialization errors**: AllocationFailure, BufferTooSmall, LayoutOverflow, SizeMismatch
/// 4. **Buffer errors**: MalformedBuffer (reported by the validators and by view construction)
///
/// Addresses are widened to `u64` so one error type serves every address width.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError
{
    /// An entry is already stored at this exact address
    #[error("Duplicate key at address 0x{address:x}")]
    DuplicateKey
    {
        /// The address that was already present
        address: u64,
    },

    /// The range has a zero size, or `base + size - 1` wraps past the maximum address
    #[error("Invalid range: base 0x{base:x}, size 0x{size:x}")]
    InvalidRange
    {
        /// Base address of the rejected range
        base: u64,
        /// Size of the rejected range
        size: u64,
    },

    /// The range intersects a range that is already stored
    ///
    /// Non-overlapping maps reject full containment, partial overlap and
    /// identical geometry alike.
    #[error("Range [0x{base:x}, 0x{high:x}] overlaps existing range [0x{existing_base:x}, 0x{existing_high:x}]")]
    OverlapViolation
    {
        /// Base address of the rejected range
        base: u64,
        /// Highest address of the rejected range
        high: u64,
        /// Base address of the stored range it collides with
        existing_base: u64,
        /// Highest address of the stored range it collides with
        existing_high: u64,
    },

    /// The range straddles the boundary of a stored range
    ///
    /// Nested maps accept ranges that are fully inside or fully around their
    /// siblings, never ones that cross a sibling's edge.
    #[error(
        "Range [0x{base:x}, 0x{high:x}] partially overlaps existing range [0x{existing_base:x}, 0x{existing_high:x}]"
    )]
    PartialContainmentViolation
    {
        /// Base address of the rejected range
        base: u64,
        /// Highest address of the rejected range
        high: u64,
        /// Base address of the stored range it crosses
        existing_base: u64,
        /// Highest address of the stored range it crosses
        existing_high: u64,
    },

    /// A range with exactly the same bounds is already stored
    #[error("Duplicate range [0x{base:x}, 0x{high:x}]")]
    DuplicateRange
    {
        /// Base address of the duplicated range
        base: u64,
        /// Highest address of the duplicated range
        high: u64,
    },

    /// Positional lookup past the last stored range
    #[error("Index {index} out of range (count {count})")]
    IndexOutOfRange
    {
        /// The requested index
        index: usize,
        /// Number of ranges stored
        count: usize,
    },

    /// The output buffer for serialization could not be allocated
    #[error("Failed to allocate {size} bytes for serialized index")]
    AllocationFailure
    {
        /// Requested buffer size in bytes
        size: usize,
    },

    /// A caller-supplied output buffer is shorter than the serialized form
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall
    {
        /// Bytes required to finish the write
        needed: usize,
        /// Bytes available in the destination
        available: usize,
    },

    /// A count, offset or entry size does not fit the layout's 32-bit header fields
    #[error("Layout overflow: {0}")]
    LayoutOverflow(String),

    /// The bytes written disagree with the precomputed size
    #[error("Serialized size mismatch: expected {expected} bytes, wrote {written}")]
    SizeMismatch
    {
        /// Size reported by `size_of`
        expected: usize,
        /// Bytes actually produced by `write`
        written: usize,
    },

    /// A serialized buffer is truncated or internally inconsistent
    #[error("Malformed buffer: {0}")]
    MalformedBuffer(String),
}

/// Convenience type alias for `Result<T, IndexError>`
///
/// ```rust
/// use symdex_core::error::IndexResult;
/// fn foo() -> IndexResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type IndexResult<T> = std::result::Result<T, IndexError>;
