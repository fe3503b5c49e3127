//! Fixed-width keys and address arithmetic.
//!
//! Every key in a serialized index occupies the same number of bytes and is
//! stored little-endian, whatever the host byte order. Readers compare keys by
//! decoding them straight out of the buffer, so encoding must be cheap and
//! lossless.

use std::fmt;

/// A key that can be stored in the packed key array of a serialized map.
///
/// ## Encoding
///
/// Keys are written as exactly `WIDTH` little-endian bytes. `read_le` decodes
/// the first `WIDTH` bytes of its input and ignores the rest, so callers may
/// hand it the tail of a larger region.
pub trait MapKey: Copy + Ord + fmt::Debug
{
    /// Encoded width in bytes
    const WIDTH: usize;

    /// Encode into `out`, which must be exactly `WIDTH` bytes long.
    fn write_le(self, out: &mut [u8]);

    /// Decode from the first `WIDTH` bytes of `bytes`.
    ///
    /// Returns `None` when fewer than `WIDTH` bytes are available.
    fn read_le(bytes: &[u8]) -> Option<Self>;

    /// Widen to `u64` for diagnostics and error reporting.
    fn to_u64(self) -> u64;
}

/// An address usable as an interval endpoint.
///
/// Ranges are described by `(base, size)` and stored by their inclusive upper
/// bound `high = base + size - 1`. All arithmetic is checked: a range whose
/// upper bound would wrap past the maximum address is invalid, never truncated.
pub trait RangeAddress: MapKey
{
    /// The lowest address
    const ZERO: Self;

    /// Inclusive upper bound of `[base, base + size - 1]`.
    ///
    /// Returns `None` for an empty range or when the bound overflows.
    fn range_high(base: Self, size: Self) -> Option<Self>;

    /// Number of addresses in `[base, high]`, with `base <= high`.
    fn range_size(base: Self, high: Self) -> Self;

    /// `self + 1`, or `None` at the maximum address.
    fn successor(self) -> Option<Self>;

    /// `self - 1`, or `None` at zero.
    fn predecessor(self) -> Option<Self>;
}

macro_rules! impl_integer_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MapKey for $ty
            {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn write_le(self, out: &mut [u8])
                {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Option<Self>
                {
                    let raw: [u8; std::mem::size_of::<$ty>()] = bytes.get(..Self::WIDTH)?.try_into().ok()?;
                    Some(<$ty>::from_le_bytes(raw))
                }

                fn to_u64(self) -> u64
                {
                    u64::from(self)
                }
            }

            impl RangeAddress for $ty
            {
                const ZERO: Self = 0;

                fn range_high(base: Self, size: Self) -> Option<Self>
                {
                    if size == 0 {
                        return None;
                    }
                    base.checked_add(size - 1)
                }

                fn range_size(base: Self, high: Self) -> Self
                {
                    high.wrapping_sub(base).wrapping_add(1)
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
        )*
    };
}

impl_integer_key!(u32, u64);

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_integer_keys_are_little_endian()
    {
        let mut out = [0u8; 4];
        0x1122_3344u32.write_le(&mut out);
        assert_eq!(out, [0x44, 0x33, 0x22, 0x11]);
        assert_eq!(u32::read_le(&out), Some(0x1122_3344));

        let mut wide = [0u8; 8];
        0x0102_0304_0506_0708u64.write_le(&mut wide);
        assert_eq!(wide[0], 0x08);
        assert_eq!(u64::read_le(&wide), Some(0x0102_0304_0506_0708));
    }

    #[test]
    fn test_read_le_short_input()
    {
        assert_eq!(u32::read_le(&[1, 2, 3]), None);
        assert_eq!(u64::read_le(&[0; 7]), None);
        // Extra trailing bytes are ignored
        assert_eq!(u32::read_le(&[1, 0, 0, 0, 0xff]), Some(1));
    }

    #[test]
    fn test_range_high()
    {
        assert_eq!(u32::range_high(10, 1), Some(10));
        assert_eq!(u32::range_high(10, 5), Some(14));
        assert_eq!(u32::range_high(10, 0), None);
        assert_eq!(u32::range_high(u32::MAX, 1), Some(u32::MAX));
        assert_eq!(u32::range_high(u32::MAX, 2), None);
        assert_eq!(u64::range_high(1, u64::MAX), Some(u64::MAX));
        assert_eq!(u64::range_high(2, u64::MAX), None);
    }

    #[test]
    fn test_range_size()
    {
        assert_eq!(u32::range_size(10, 14), 5);
        assert_eq!(u32::range_size(7, 7), 1);
        assert_eq!(u64::range_size(0, u64::MAX - 1), u64::MAX);
    }

    #[test]
    fn test_successor_predecessor()
    {
        assert_eq!(5u32.successor(), Some(6));
        assert_eq!(u32::MAX.successor(), None);
        assert_eq!(5u64.predecessor(), Some(4));
        assert_eq!(0u64.predecessor(), None);
    }
}
