//! Module-relative address type.

use std::fmt;

use super::key::{MapKey, RangeAddress};

/// Strongly typed 64-bit address
///
/// This wrapper around `u64` keeps addresses from being mixed up with sizes,
/// counts or line numbers when building indexes from symbol data. It is a
/// drop-in key for every map in this crate and serializes exactly like a `u64`.
///
/// ## Example
///
/// ```rust
/// use symdex_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// let next_addr = addr.checked_add(0x100).unwrap();
/// assert_eq!(next_addr.value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// This is equivalent to `Address::from(value)` but can be used in const contexts.
    ///
    /// ```rust
    /// use symdex_core::types::Address;
    ///
    /// const TEXT_BASE: Address = Address::new(0x40_0000);
    /// assert_eq!(TEXT_BASE.value(), 0x40_0000);
    /// ```
    #[must_use]
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    #[must_use]
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use symdex_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None); // Overflow
    /// ```
    #[must_use]
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Subtract an offset from this address, checking for underflow
    #[must_use]
    pub fn checked_sub(self, offset: u64) -> Option<Self>
    {
        self.0.checked_sub(offset).map(Address)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl MapKey for Address
{
    const WIDTH: usize = u64::WIDTH;

    fn write_le(self, out: &mut [u8])
    {
        self.0.write_le(out);
    }

    fn read_le(bytes: &[u8]) -> Option<Self>
    {
        u64::read_le(bytes).map(Address)
    }

    fn to_u64(self) -> u64
    {
        self.0
    }
}

impl RangeAddress for Address
{
    const ZERO: Self = Address::ZERO;

    fn range_high(base: Self, size: Self) -> Option<Self>
    {
        u64::range_high(base.0, size.0).map(Address)
    }

    fn range_size(base: Self, high: Self) -> Self
    {
        Address(u64::range_size(base.0, high.0))
    }

    fn successor(self) -> Option<Self>
    {
        self.checked_add(1)
    }

    fn predecessor(self) -> Option<Self>
    {
        self.checked_sub(1)
    }
}
