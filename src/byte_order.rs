//! Helpers for explicit network byte-order conversions.
//!
//! Every integer on the snapwire wire is a big-endian `u32`. These helpers
//! keep Clippy expectations scoped to the conversion points so the codec can
//! remain explicit about wire endianness without repeating lint annotations.

/// Serialise a `u32` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use snapwire::byte_order::write_network_u32;
///
/// assert_eq!(write_network_u32(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use snapwire::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

/// Read the network-order `u32` starting at `offset`, if `bytes` is long
/// enough to hold it.
///
/// # Examples
///
/// ```
/// use snapwire::byte_order::read_network_u32_at;
///
/// let bytes = [0, 0, 0, 1, 0, 0, 0, 7];
/// assert_eq!(read_network_u32_at(&bytes, 4), Some(7));
/// assert_eq!(read_network_u32_at(&bytes, 6), None);
/// ```
#[must_use]
pub fn read_network_u32_at(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let word: [u8; 4] = bytes.get(offset..end)?.try_into().ok()?;
    Some(read_network_u32(word))
}

#[cfg(test)]
mod tests {
    //! Conversion tests for the network byte-order helpers.

    use rstest::rstest;

    use super::{read_network_u32, read_network_u32_at, write_network_u32};

    #[rstest]
    #[case::zero(0, [0, 0, 0, 0])]
    #[case::one(1, [0, 0, 0, 1])]
    #[case::mixed(0x1234_5678, [0x12, 0x34, 0x56, 0x78])]
    #[case::max(u32::MAX, [0xFF, 0xFF, 0xFF, 0xFF])]
    fn network_u32_uses_big_endian_layout(#[case] value: u32, #[case] expected: [u8; 4]) {
        assert_eq!(write_network_u32(value), expected);
        assert_eq!(read_network_u32(expected), value);
    }

    #[rstest]
    #[case::empty(&[], 0, None)]
    #[case::short(&[0, 0, 1], 0, None)]
    #[case::exact(&[0, 0, 0, 9], 0, Some(9))]
    #[case::offset(&[0xAA, 0, 0, 1, 0], 1, Some(256))]
    #[case::overflowing_offset(&[0, 0, 0, 0], usize::MAX, None)]
    fn reads_words_at_offsets(
        #[case] bytes: &[u8],
        #[case] offset: usize,
        #[case] expected: Option<u32>,
    ) {
        assert_eq!(read_network_u32_at(bytes, offset), expected);
    }
}
